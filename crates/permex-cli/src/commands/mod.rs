//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;
pub mod records;

use std::path::Path;

use permex_core::PermexConfig;
use tracing::debug;

/// Explicit `--config` file, else the user config file when present, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PermexConfig> {
    if let Some(path) = path {
        return Ok(PermexConfig::from_file(path)?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(PermexConfig::from_file(&default_path)?)
    } else {
        Ok(PermexConfig::default())
    }
}
