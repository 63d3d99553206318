//! CLI configuration loading.

use anyhow::{Context, Result};
use plume_core::PlumeConfig;
use std::path::Path;
use tracing::debug;

/// Load configuration.
///
/// Configuration precedence:
/// 1. Environment variables (a `.env` file is read first)
/// 2. `--config` file, or else the local `./plume.toml`
/// 3. Global config file (`~/.plume/config.toml`)
/// 4. Defaults
pub fn load_config(explicit: Option<&Path>) -> Result<PlumeConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env file");
    }

    let mut config = match explicit {
        Some(path) => PlumeConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PlumeConfig::discover_and_load().context("Failed to load configuration")?,
    };

    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
