use serde::Deserialize;

use crate::types::{filter_of, port_or_default, present, Scalar, TableFilter};
use crate::wrapper::RestoreScriptOptions;
use crate::{MysqlError, Result};

/// Body of a restore request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreRequest {
    /// Full path of the backup directory to restore from
    pub backup_dir: Option<String>,
    pub target_db: Option<String>,
    pub host: Option<String>,
    pub port: Option<Scalar>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tables: Option<TableFilter>,
    pub ignore_tables: Option<TableFilter>,
    pub overwrite_tables: Option<TableFilter>,
}

impl RestoreRequest {
    pub fn validate(self) -> Result<RestoreScriptOptions> {
        let (Some(backup_dir), Some(target_db), Some(host), Some(user), Some(password)) = (
            present(&self.backup_dir),
            present(&self.target_db),
            present(&self.host),
            present(&self.user),
            present(&self.password),
        ) else {
            return Err(MysqlError::Validation(
                "Missing required parameters: backup_dir, target_db, host, user, password"
                    .to_string(),
            ));
        };

        Ok(RestoreScriptOptions {
            backup_dir: backup_dir.to_string(),
            target_db: target_db.to_string(),
            host: host.to_string(),
            port: port_or_default(&self.port),
            user: user.to_string(),
            password: password.to_string(),
            tables: filter_of(&self.tables),
            ignore_tables: filter_of(&self.ignore_tables),
            overwrite_tables: filter_of(&self.overwrite_tables),
        })
    }
}
