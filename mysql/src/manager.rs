use log::{info, warn};
use std::path::Path;

use crate::backup::BackupRequest;
use crate::catalog::{self, BackupEntry, BackupLog, BackupTables, LogKind};
use crate::connection::ConnectionRequest;
use crate::locks::InvocationLocks;
use crate::restore::RestoreRequest;
use crate::types::{ManagerConfig, ScriptReport};
use crate::wrapper::{MysqlClient, ScriptRunner};
use crate::Result;

/// Main entry point for backup, restore and catalog operations
#[derive(Debug, Clone)]
pub struct MysqlManager {
    config: ManagerConfig,
    scripts: ScriptRunner,
    client: MysqlClient,
    locks: InvocationLocks,
}

impl MysqlManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            scripts: ScriptRunner::new(config.scripts_dir.clone()),
            client: MysqlClient::new(config.mysql_client.clone()),
            locks: InvocationLocks::new(config.serialize_invocations),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn backup_root(&self) -> &Path {
        &self.config.backup_root
    }

    /// Probe the server; returns the message shown on success
    pub async fn test_connection(&self, request: ConnectionRequest) -> Result<String> {
        let options = request.validate()?;
        info!(
            "Testing connection to {}:{} as {}",
            options.host, options.port, options.user
        );

        self.client
            .probe(&options, self.config.probe_timeout)
            .await?;

        Ok(match &options.database {
            Some(db) => format!("Connection succeeded, database {db} is accessible"),
            None => "Connection succeeded".to_string(),
        })
    }

    /// Validate the request and run the backup script
    pub async fn backup(&self, request: BackupRequest) -> Result<ScriptReport> {
        let options = request.validate(&self.config.backup_root)?;

        let _guard = self.locks.acquire(Path::new(&options.backup_root)).await;
        info!(
            "Starting backup of {} on {}:{} into {}",
            options.database, options.host, options.port, options.backup_root
        );

        let output = self
            .scripts
            .run(
                &self.config.backup_script,
                &options.args(),
                self.config.script_timeout,
            )
            .await?;

        let report = ScriptReport::from_output(output);
        match &report {
            Ok(_) => info!("Backup of {} completed", options.database),
            Err(e) => warn!("Backup of {} failed: {e}", options.database),
        }
        report
    }

    /// Validate the request and run the restore script
    pub async fn restore(&self, request: RestoreRequest) -> Result<ScriptReport> {
        let options = request.validate()?;

        let _guard = self.locks.acquire(Path::new(&options.backup_dir)).await;
        info!(
            "Starting restore of {} into {} on {}:{}",
            options.backup_dir, options.target_db, options.host, options.port
        );

        let output = self
            .scripts
            .run(
                &self.config.restore_script,
                &options.args(),
                self.config.script_timeout,
            )
            .await?;

        let report = ScriptReport::from_output(output);
        match &report {
            Ok(_) => info!("Restore into {} completed", options.target_db),
            Err(e) => warn!("Restore into {} failed: {e}", options.target_db),
        }
        report
    }

    pub fn list_backups(&self, database: Option<&str>) -> Result<Vec<BackupEntry>> {
        catalog::list_backups(&self.config.backup_root, database)
    }

    pub fn read_log(&self, dir_name: &str, kind: LogKind) -> Result<BackupLog> {
        catalog::read_log(&self.config.backup_root, dir_name, kind)
    }

    pub fn list_tables(&self, dir_name: &str) -> Result<BackupTables> {
        catalog::list_tables(&self.config.backup_root, dir_name)
    }

    pub fn delete_backup(&self, dir_name: &str) -> Result<()> {
        catalog::delete_backup(&self.config.backup_root, dir_name)
    }

    /// Log what is missing from the environment. Nothing here is fatal: the
    /// scripts may be mounted later and each request re-checks.
    pub async fn check_environment(&self) {
        for script in [&self.config.backup_script, &self.config.restore_script] {
            let path = self.scripts.script_path(script);
            if path.is_file() {
                info!("Found script {}", path.display());
            } else {
                warn!("Script {} does not exist", path.display());
            }
        }

        match self.client.check_availability().await {
            Ok(version) => info!("Using {version}"),
            Err(e) => warn!("{} is not usable: {e}", self.client.program()),
        }

        if !self.config.backup_root.is_dir() {
            warn!(
                "Backup root {} does not exist yet",
                self.config.backup_root.display()
            );
        }
    }
}
