pub mod config;
pub mod detect;
pub mod measure;

use std::path::Path;

use anyhow::{Context, Result};
use subframe_core::config::SubframeConfig;
use tracing::info;

/// Load a run configuration from TOML, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<SubframeConfig> {
    let Some(path) = path else {
        return Ok(SubframeConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&contents).context("Invalid subframe config")?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
