use config::{Config, ConfigError, Environment, File};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration files consulted in order; later files override earlier ones.
pub const CONFIG_PATHS: [&str; 3] = [
    "/etc/mysql-warden/mysql-warden.toml",
    "~/.config/mysql-warden/mysql-warden.toml",
    "mysql-warden.toml",
];

/// Environment variables with this prefix override file values,
/// e.g. `MYSQL_WARDEN__PATHS__BACKUP_ROOT=/srv/backups`.
pub const ENV_PREFIX: &str = "MYSQL_WARDEN";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WardenConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub scripts: ScriptsConfig,
    pub timeouts: TimeoutsConfig,
    pub invocations: InvocationsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory holding the backup and restore scripts
    pub scripts_dir: PathBuf,
    /// Directory under which every backup directory lives
    pub backup_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptsConfig {
    pub backup: String,
    pub restore: String,
    /// Program used for connection probes, resolved through `PATH`
    pub mysql_client: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    pub script_secs: u64,
    pub probe_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvocationsConfig {
    /// Serialize script runs that target the same directory
    pub serialize: bool,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8081,
            },
            paths: PathsConfig {
                scripts_dir: PathBuf::from("/scripts"),
                backup_root: PathBuf::from("/data/backup/mysql"),
            },
            scripts: ScriptsConfig {
                backup: "mysql-backup-schema-data.sh".to_string(),
                restore: "mysql-restore-schema-data.sh".to_string(),
                mysql_client: "mysql".to_string(),
            },
            timeouts: TimeoutsConfig {
                script_secs: 3600,
                probe_secs: 10,
            },
            invocations: InvocationsConfig { serialize: true },
        }
    }
}

/// Loads the configuration from defaults, the well-known config files, an
/// optional explicit file and finally the environment.
pub fn load_config(extra: Option<&Path>) -> Result<WardenConfig, ConfigError> {
    let defaults = WardenConfig::default();

    let config_builder = Config::builder()
        .set_default("server.bind", defaults.server.bind)?
        .set_default("server.port", defaults.server.port)?
        .set_default(
            "paths.scripts_dir",
            defaults.paths.scripts_dir.to_string_lossy().into_owned(),
        )?
        .set_default(
            "paths.backup_root",
            defaults.paths.backup_root.to_string_lossy().into_owned(),
        )?
        .set_default("scripts.backup", defaults.scripts.backup)?
        .set_default("scripts.restore", defaults.scripts.restore)?
        .set_default("scripts.mysql_client", defaults.scripts.mysql_client)?
        .set_default("timeouts.script_secs", defaults.timeouts.script_secs)?
        .set_default("timeouts.probe_secs", defaults.timeouts.probe_secs)?
        .set_default("invocations.serialize", defaults.invocations.serialize)?;

    let config_builder = CONFIG_PATHS
        .iter()
        .filter_map(|path| match shellexpand::full(path) {
            Ok(expanded) => Some(expanded.into_owned()),
            Err(e) => {
                warn!("Skipping config path {path}: {e}");
                None
            }
        })
        .fold(config_builder, |builder, path| {
            if Path::new(&path).exists() {
                debug!("Reading configuration from {path}");
                builder.add_source(File::with_name(&path))
            } else {
                builder
            }
        });

    let config_builder = match extra {
        Some(path) => {
            debug!("Reading configuration from {}", path.display());
            config_builder.add_source(File::from(path).required(true))
        }
        None => config_builder,
    };

    config_builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// Renders the configuration as TOML, the same format the config files use.
pub fn render_config(config: &WardenConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
