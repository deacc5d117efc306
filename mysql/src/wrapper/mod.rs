pub mod mysql_client;
pub mod process;
pub mod script;

// Re-export for convenience
pub use mysql_client::{probe_statement, MysqlClient, ProbeOptions};
pub use process::{run_with_timeout, ProcessOutput};
pub use script::{BackupScriptOptions, RestoreScriptOptions, ScriptRunner};
