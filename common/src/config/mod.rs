mod file;

pub use file::{
    load_config, render_config, InvocationsConfig, PathsConfig, ScriptsConfig, ServerConfig,
    TimeoutsConfig, WardenConfig, CONFIG_PATHS, ENV_PREFIX,
};
