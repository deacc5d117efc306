use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use uuid::Uuid;

use super::process::{run_with_timeout, ProcessOutput};
use crate::{MysqlError, Result};

const REDACTED: &str = "******";

/// Options for the backup script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupScriptOptions {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub backup_root: String,
    pub tables: Option<String>,
    pub ignore_tables: Option<String>,
    /// Retention cleanup; only forwarded when positive
    pub clean_days: Option<u64>,
}

impl BackupScriptOptions {
    /// `-H host -P port -u user -p password -d database -b root [-t] [-i] [-c]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-H".to_string(),
            self.host.clone(),
            "-P".to_string(),
            self.port.clone(),
            "-u".to_string(),
            self.user.clone(),
            "-p".to_string(),
            self.password.clone(),
            "-d".to_string(),
            self.database.clone(),
            "-b".to_string(),
            self.backup_root.clone(),
        ];

        if let Some(tables) = &self.tables {
            args.push("-t".to_string());
            args.push(tables.clone());
        }

        if let Some(ignore_tables) = &self.ignore_tables {
            args.push("-i".to_string());
            args.push(ignore_tables.clone());
        }

        if let Some(days) = self.clean_days.filter(|days| *days > 0) {
            args.push("-c".to_string());
            args.push(days.to_string());
        }

        args
    }
}

/// Options for the restore script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreScriptOptions {
    pub backup_dir: String,
    pub target_db: String,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub tables: Option<String>,
    pub ignore_tables: Option<String>,
    pub overwrite_tables: Option<String>,
}

impl RestoreScriptOptions {
    /// `-b dir -d target -H host -P port -u user -p password [-t] [-i] [-o]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-b".to_string(),
            self.backup_dir.clone(),
            "-d".to_string(),
            self.target_db.clone(),
            "-H".to_string(),
            self.host.clone(),
            "-P".to_string(),
            self.port.clone(),
            "-u".to_string(),
            self.user.clone(),
            "-p".to_string(),
            self.password.clone(),
        ];

        for (flag, value) in [
            ("-t", &self.tables),
            ("-i", &self.ignore_tables),
            ("-o", &self.overwrite_tables),
        ] {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }

        args
    }
}

/// Copy of `args` safe for logs: the value following `-p` is masked
pub fn redact_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push(REDACTED.to_string());
            mask_next = false;
        } else {
            mask_next = arg == "-p";
            redacted.push(arg.clone());
        }
    }
    redacted
}

/// Runs scripts from a fixed directory
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    scripts_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn script_path(&self, script_name: &str) -> PathBuf {
        self.scripts_dir.join(script_name)
    }

    /// Run `script_name` with `args`, killing it once `limit` elapses.
    ///
    /// A nonzero exit is not an error here; the caller decides what it means.
    pub async fn run(
        &self,
        script_name: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<ProcessOutput> {
        let script_path = self.script_path(script_name);
        if !script_path.is_file() {
            error!("Script does not exist: {}", script_path.display());
            return Err(MysqlError::ScriptNotFound(script_path));
        }

        let invocation = Uuid::new_v4();
        info!("[{invocation}] Running {script_name} (timeout {limit:?})");
        debug!(
            "[{invocation}] {} {}",
            script_path.display(),
            redact_args(args).join(" ")
        );

        let mut cmd = Command::new(&script_path);
        cmd.args(args);

        let started = Instant::now();
        let result = run_with_timeout(cmd, script_name, limit).await;

        match &result {
            Ok(output) => info!(
                "[{invocation}] {script_name} finished with code {} in {:?}",
                output.returncode(),
                started.elapsed()
            ),
            Err(e) => error!("[{invocation}] {script_name} failed: {e}"),
        }

        result
    }
}
