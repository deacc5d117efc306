use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use walkdir::WalkDir;

use crate::types::BackupDirName;
use crate::{MysqlError, Result};

const SCHEMA_DIR: &str = "schema";
const VIEWS_FILE: &str = ".views";
const SQL_EXTENSION: &str = ".sql";

/// Placeholder returned while a log file has not been written yet
pub const MISSING_LOG_PLACEHOLDER: &str = "(log file not generated yet)";

/// One backup directory as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub database: String,
    pub backup_time: String,
    pub backup_dir: String,
    pub dir_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Backup,
    Restore,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Backup => "backup.log",
            LogKind::Restore => "restore.log",
        }
    }
}

impl FromStr for LogKind {
    type Err = MysqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backup" => Ok(LogKind::Backup),
            "restore" => Ok(LogKind::Restore),
            _ => Err(MysqlError::Validation(
                "type must be either backup or restore".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupLog {
    pub content: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupTables {
    pub tables: Vec<String>,
    pub views: Vec<String>,
}

/// Lists backup directories directly under `root`, newest first.
///
/// Only directories whose names parse as [`BackupDirName`] are returned. A
/// missing root is an empty listing, and entries that vanish or cannot be
/// measured mid-scan count as zero bytes instead of failing the scan.
pub fn list_backups(root: &Path, database: Option<&str>) -> Result<Vec<BackupEntry>> {
    if !root.is_dir() {
        debug!("Backup root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let database = database.map(str::trim).filter(|db| !db.is_empty());
    let mut items = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Ok(name) = BackupDirName::parse(&file_name) else {
            continue;
        };

        if database.is_some_and(|db| db != name.database()) {
            continue;
        }

        items.push(BackupEntry {
            database: name.database().to_string(),
            backup_time: name.backup_time(),
            backup_dir: path.to_string_lossy().into_owned(),
            dir_name: file_name,
            size: directory_size(&path),
        });
    }

    // Zero-padded timestamps sort chronologically as strings
    items.sort_by(|a, b| b.backup_time.cmp(&a.backup_time));

    Ok(items)
}

/// Total size of every file below `path`; unreadable entries count as zero
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| fs::metadata(entry.path()).map(|m| m.len()).unwrap_or(0))
        .sum()
}

/// Reads `backup.log` or `restore.log` from a backup directory
pub fn read_log(root: &Path, dir_name: &str, kind: LogKind) -> Result<BackupLog> {
    let name = BackupDirName::parse(dir_name)?;
    let log_path = name.path_in(root).join(kind.file_name());

    if !log_path.is_file() {
        return Ok(BackupLog {
            content: MISSING_LOG_PLACEHOLDER.to_string(),
            exists: false,
        });
    }

    let bytes = fs::read(&log_path)?;
    Ok(BackupLog {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        exists: true,
    })
}

/// Lists the tables and views dumped into a backup's `schema` directory
pub fn list_tables(root: &Path, dir_name: &str) -> Result<BackupTables> {
    let name = BackupDirName::parse(dir_name)?;
    let schema_dir = name.path_in(root).join(SCHEMA_DIR);

    if !schema_dir.is_dir() {
        return Ok(BackupTables::default());
    }

    let views = read_view_names(&schema_dir.join(VIEWS_FILE));

    let mut file_names: Vec<String> = fs::read_dir(&schema_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    file_names.sort();

    let mut listing = BackupTables::default();
    for file_name in file_names {
        if file_name.starts_with('.') {
            continue;
        }
        let Some(object) = file_name.strip_suffix(SQL_EXTENSION) else {
            continue;
        };

        if views.contains(object) {
            listing.views.push(object.to_string());
        } else {
            listing.tables.push(object.to_string());
        }
    }

    Ok(listing)
}

/// Names listed in the `.views` marker; a missing or unreadable file is empty
fn read_view_names(path: &Path) -> HashSet<String> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Ignoring unreadable view list {}: {}", path.display(), e);
            }
            HashSet::new()
        }
    }
}

/// Removes a backup directory and everything in it.
///
/// Removal is not transactional: if it fails half way the remaining files
/// stay where they are and the error is returned.
pub fn delete_backup(root: &Path, dir_name: &str) -> Result<()> {
    let name = BackupDirName::parse(dir_name)?;
    let path = name.path_in(root);

    if !path.is_dir() {
        return Err(MysqlError::BackupNotFound(name.as_str().to_string()));
    }

    fs::remove_dir_all(&path)?;
    info!("Deleted backup directory {}", path.display());
    Ok(())
}
