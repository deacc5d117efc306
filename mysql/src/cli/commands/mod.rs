use anyhow::{anyhow, Context, Result};
use log::{error, info};

use super::MysqlCommands;
use crate::catalog::LogKind;
use crate::types::{Scalar, ScriptReport, TableFilter};
use crate::{BackupRequest, ConnectionRequest, MysqlError, MysqlManager, RestoreRequest};

/// Run one `mysql` subcommand against `manager`
pub async fn execute(command: MysqlCommands, manager: &MysqlManager) -> Result<()> {
    match command {
        MysqlCommands::TestConnection {
            host,
            port,
            user,
            password,
            database,
        } => {
            let request = ConnectionRequest {
                host: Some(host),
                port: Some(Scalar::Text(port)),
                user: Some(user),
                password,
                database,
            };
            let message = manager.test_connection(request).await?;
            info!("{message}");
        }
        MysqlCommands::Backup {
            host,
            port,
            user,
            password,
            database,
            backup_dir,
            tables,
            ignore_tables,
            clean_days,
        } => {
            let request = BackupRequest {
                host: Some(host),
                port: Some(Scalar::Text(port)),
                user: Some(user),
                password,
                database: Some(database),
                backup_dir,
                tables: tables.as_deref().map(TableFilter::from),
                ignore_tables: ignore_tables.as_deref().map(TableFilter::from),
                clean_days: clean_days.map(Scalar::Integer),
            };
            report_script("Backup", manager.backup(request).await)?;
        }
        MysqlCommands::Restore {
            backup_dir,
            target_db,
            host,
            port,
            user,
            password,
            tables,
            ignore_tables,
            overwrite_tables,
        } => {
            let request = RestoreRequest {
                backup_dir: Some(backup_dir),
                target_db: Some(target_db),
                host: Some(host),
                port: Some(Scalar::Text(port)),
                user: Some(user),
                password,
                tables: tables.as_deref().map(TableFilter::from),
                ignore_tables: ignore_tables.as_deref().map(TableFilter::from),
                overwrite_tables: overwrite_tables.as_deref().map(TableFilter::from),
            };
            report_script("Restore", manager.restore(request).await)?;
        }
        MysqlCommands::ListBackups { database } => {
            let items = manager
                .list_backups(database.as_deref())
                .context("Failed to list backups")?;

            info!(
                "{} backup(s) in {}",
                items.len(),
                manager.backup_root().display()
            );
            for item in items {
                info!(
                    "{}  database: {}, time: {}, size: {} bytes",
                    item.dir_name, item.database, item.backup_time, item.size
                );
            }
        }
        MysqlCommands::ShowLog { dir_name, kind } => {
            let kind: LogKind = kind.parse()?;
            let log = manager.read_log(&dir_name, kind)?;
            if log.exists {
                info!("{} of {dir_name}:\n{}", kind.file_name(), log.content);
            } else {
                info!("{}", log.content);
            }
        }
        MysqlCommands::ListTables { dir_name } => {
            let listing = manager.list_tables(&dir_name)?;
            info!("Tables ({}): {}", listing.tables.len(), listing.tables.join(", "));
            info!("Views ({}): {}", listing.views.len(), listing.views.join(", "));
        }
        MysqlCommands::DeleteBackup { dir_name } => {
            manager.delete_backup(&dir_name)?;
            info!("Deleted {dir_name}");
        }
    }

    Ok(())
}

/// Print whatever the script wrote, then turn failures into an error
fn report_script(operation: &str, result: crate::Result<ScriptReport>) -> Result<()> {
    match result {
        Ok(report) => {
            print_streams(&report.stdout, &report.stderr);
            info!("{operation} succeeded");
            Ok(())
        }
        Err(MysqlError::ScriptFailed {
            stdout,
            stderr,
            code,
        }) => {
            print_streams(&stdout, &stderr);
            Err(anyhow!("{operation} failed with exit code {code}"))
        }
        Err(e) => Err(anyhow!("{operation} failed: {e}")),
    }
}

fn print_streams(stdout: &str, stderr: &str) {
    if !stdout.trim().is_empty() {
        info!("stdout:\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        error!("stderr:\n{}", stderr.trim_end());
    }
}
