pub mod backup;
pub mod catalog;
pub mod cli;
pub mod connection;
pub mod locks;
pub mod manager;
pub mod restore;
pub mod types;
pub mod wrapper;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MysqlError {
    /// Missing or malformed input, detected before anything is spawned
    #[error("{0}")]
    Validation(String),

    #[error("Backup directory does not exist: {0}")]
    BackupNotFound(String),

    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("{0} client not found")]
    ClientNotFound(String),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {after:?}")]
    TimedOut { program: String, after: Duration },

    #[error("Script exited with code {code}")]
    ScriptFailed {
        stdout: String,
        stderr: String,
        code: i32,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for MysqlError {
    fn from(err: std::io::Error) -> Self {
        MysqlError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, MysqlError>;

// Re-export key types for convenience
pub use backup::BackupRequest;
pub use catalog::{BackupEntry, BackupLog, BackupTables, LogKind};
pub use types::{BackupDirName, ManagerConfig, ScriptReport};
pub use connection::ConnectionRequest;
pub use manager::MysqlManager;
pub use restore::RestoreRequest;
