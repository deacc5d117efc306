use serde::Deserialize;
use std::path::Path;

use crate::types::{filter_of, port_or_default, present, Scalar, TableFilter};
use crate::wrapper::BackupScriptOptions;
use crate::{MysqlError, Result};

/// Body of a backup request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupRequest {
    pub host: Option<String>,
    pub port: Option<Scalar>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// Backup root handed to the script; the configured root when absent
    pub backup_dir: Option<String>,
    pub tables: Option<TableFilter>,
    pub ignore_tables: Option<TableFilter>,
    pub clean_days: Option<Scalar>,
}

impl BackupRequest {
    pub fn validate(self, default_root: &Path) -> Result<BackupScriptOptions> {
        let (Some(host), Some(user), Some(password), Some(database)) = (
            present(&self.host),
            present(&self.user),
            present(&self.password),
            present(&self.database),
        ) else {
            return Err(MysqlError::Validation(
                "Missing required parameters: host, user, password, database".to_string(),
            ));
        };

        let clean_days = match &self.clean_days {
            Some(days) => {
                let days = days.to_integer("clean_days")?;
                // Anything up to zero means "do not clean"
                u64::try_from(days).ok().filter(|days| *days > 0)
            }
            None => None,
        };

        let backup_root = present(&self.backup_dir)
            .map(str::to_string)
            .unwrap_or_else(|| default_root.to_string_lossy().into_owned());

        Ok(BackupScriptOptions {
            host: host.to_string(),
            port: port_or_default(&self.port),
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
            backup_root,
            tables: filter_of(&self.tables),
            ignore_tables: filter_of(&self.ignore_tables),
            clean_days,
        })
    }
}
