use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use common::config::{load_config, render_config};
use mysql::cli::{MysqlCommands, PathOverrides};
use mysql::{ManagerConfig, MysqlManager};

#[derive(Parser, Debug)]
#[clap(
    name = "mysql-warden",
    about = "Management API for MySQL backup and restore scripts",
    version
)]
struct Cli {
    /// Additional configuration file, applied after the default locations
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API in the foreground
    Run(server::cli::RunArgs),

    /// Run backup, restore and catalog operations directly
    Mysql {
        #[clap(flatten)]
        overrides: PathOverrides,

        #[clap(subcommand)]
        command: MysqlCommands,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_level(true)
        .format_module_path(false)
        .format_indent(Some(4))
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Run(args) => {
            let manager_config = ManagerConfig::from_config(&config);
            server::cli::run::execute(config, args, manager_config).await?;
        }
        Commands::Mysql { overrides, command } => {
            let mut manager_config = ManagerConfig::from_config(&config);
            overrides.apply(&mut manager_config);

            let manager = MysqlManager::new(manager_config);
            mysql::cli::commands::execute(command, &manager).await?;
        }
        Commands::Config => {
            let rendered = render_config(&config).context("Failed to render configuration")?;
            println!("{rendered}");
        }
    }

    Ok(())
}
