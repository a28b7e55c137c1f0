pub mod config_check;
pub mod generate;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Load the config file (explicit path or search path) and apply environment overrides.
pub fn load_config(config_path: Option<String>) -> Result<Config> {
    let mut config = Config::load_with_path(config_path)?;
    config.apply_env_overrides()?;
    Ok(config)
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
