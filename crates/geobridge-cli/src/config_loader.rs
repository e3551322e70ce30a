//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geobridge_core::config::{CliConfigOverrides, LayeredConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Load layered configuration
///
/// An explicit `--config` file must exist; otherwise `geobridge.toml` in the
/// working directory is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(explicit)? {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    explicit: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(explicit)?;
    config.update_from_cli(overrides);
    Ok(config)
}

fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        anyhow::ensure!(path.is_file(), "Configuration file not found: {}", path.display());
        return Ok(Some(path.to_path_buf()));
    }

    let default = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    Ok(default.is_file().then_some(default))
}
