use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::config::WardenConfig;

use crate::wrapper::ProcessOutput;
use crate::{MysqlError, Result};

/// Backup directories are named `{database}_{YYYYMMDD}_{HHMMSS}`
static BACKUP_DIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_([0-9]{8})_([0-9]{6})$").expect("backup directory pattern is valid")
});

pub const DEFAULT_PORT: &str = "3306";

/// Paths, script names and limits used by every operation
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub scripts_dir: PathBuf,
    pub backup_root: PathBuf,
    pub backup_script: String,
    pub restore_script: String,
    pub mysql_client: String,
    pub script_timeout: Duration,
    pub probe_timeout: Duration,
    pub serialize_invocations: bool,
}

impl ManagerConfig {
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            scripts_dir: config.paths.scripts_dir.clone(),
            backup_root: config.paths.backup_root.clone(),
            backup_script: config.scripts.backup.clone(),
            restore_script: config.scripts.restore.clone(),
            mysql_client: config.scripts.mysql_client.clone(),
            script_timeout: Duration::from_secs(config.timeouts.script_secs),
            probe_timeout: Duration::from_secs(config.timeouts.probe_secs),
            serialize_invocations: config.invocations.serialize,
        }
    }

    /// Absolute location of a script inside the scripts directory
    pub fn script_path(&self, script_name: &str) -> PathBuf {
        self.scripts_dir.join(script_name)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::from_config(&WardenConfig::default())
    }
}

/// A validated backup directory name.
///
/// This is the only way a caller-supplied name becomes part of a filesystem
/// path: parsing rejects separators and parent references before the name is
/// ever joined onto the backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDirName {
    name: String,
    database: String,
    date: String,
    time: String,
}

impl BackupDirName {
    pub fn parse(name: &str) -> Result<Self> {
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            debug!("Rejecting backup directory name with path components: {name:?}");
            return Err(invalid_name());
        }

        let captures = BACKUP_DIR_PATTERN.captures(name).ok_or_else(invalid_name)?;

        Ok(Self {
            name: name.to_string(),
            database: captures[1].to_string(),
            date: captures[2].to_string(),
            time: captures[3].to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// `YYYY-MM-DD HH:MM:SS`, taken positionally from the name
    pub fn backup_time(&self) -> String {
        let (d, t) = (&self.date, &self.time);
        format!(
            "{}-{}-{} {}:{}:{}",
            &d[0..4],
            &d[4..6],
            &d[6..8],
            &t[0..2],
            &t[2..4],
            &t[4..6]
        )
    }

    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}

fn invalid_name() -> MysqlError {
    MysqlError::Validation("Invalid backup directory name".to_string())
}

/// Captured output of a script run that exited with code zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptReport {
    pub stdout: String,
    pub stderr: String,
}

impl ScriptReport {
    /// Turns a finished process into a report, or into `ScriptFailed` when
    /// the exit code is not zero. Output is passed through untouched.
    pub fn from_output(output: ProcessOutput) -> Result<Self> {
        if output.success() {
            Ok(Self {
                stdout: output.stdout,
                stderr: output.stderr,
            })
        } else {
            let code = output.returncode();
            Err(MysqlError::ScriptFailed {
                stdout: output.stdout,
                stderr: output.stderr,
                code,
            })
        }
    }
}

/// A JSON scalar that may arrive either as a number or a string, such as
/// `"port": 3306` or `"port": "3306"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    pub fn to_integer(&self, field: &str) -> Result<i64> {
        match self {
            Scalar::Integer(n) => Ok(*n),
            Scalar::Float(n) if n.is_finite() => Ok(n.trunc() as i64),
            Scalar::Float(_) => Err(not_an_integer(field)),
            Scalar::Text(s) => s.trim().parse().map_err(|_| not_an_integer(field)),
        }
    }
}

fn not_an_integer(field: &str) -> MysqlError {
    MysqlError::Validation(format!("{field} must be an integer"))
}

/// Table filters accept either `"a,b"` or `["a", "b"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TableFilter {
    Joined(String),
    List(Vec<String>),
}

impl TableFilter {
    /// The comma-separated form the scripts expect, or `None` when empty
    pub fn joined(&self) -> Option<String> {
        let joined = match self {
            TableFilter::Joined(s) => s.clone(),
            TableFilter::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        };

        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

impl From<&str> for TableFilter {
    fn from(value: &str) -> Self {
        TableFilter::Joined(value.to_string())
    }
}

/// Returns the value when it is present and not empty
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub(crate) fn port_or_default(port: &Option<Scalar>) -> String {
    match port {
        Some(port) => {
            let port = port.to_text();
            if port.trim().is_empty() {
                DEFAULT_PORT.to_string()
            } else {
                port
            }
        }
        None => DEFAULT_PORT.to_string(),
    }
}

pub(crate) fn filter_of(filter: &Option<TableFilter>) -> Option<String> {
    filter.as_ref().and_then(TableFilter::joined)
}
