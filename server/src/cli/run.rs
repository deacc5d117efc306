use anyhow::Result;
use common::config::WardenConfig;
use log::info;
use mysql::{ManagerConfig, MysqlManager};

use super::RunArgs;
use crate::Server;

pub async fn execute(
    mut config: WardenConfig,
    args: RunArgs,
    manager_config: ManagerConfig,
) -> Result<()> {
    info!("Running mysql-warden in the foreground...");

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("Scripts directory: {}", manager_config.scripts_dir.display());
    info!("Backup root: {}", manager_config.backup_root.display());
    info!(
        "Script timeout: {}s, probe timeout: {}s",
        manager_config.script_timeout.as_secs(),
        manager_config.probe_timeout.as_secs()
    );

    let manager = MysqlManager::new(manager_config);
    manager.check_environment().await;

    Server::new(config.server, manager).start().await
}
