//! Configuration file discovery and loading.
//!
//! Lookup order, first hit wins:
//! 1. `--config PATH` (must exist)
//! 2. `./callnet.toml`
//! 3. `<config dir>/callnet/config.toml`
//! 4. built-in defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callnet_analytics::AnalysisConfig;
use tracing::debug;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "callnet.toml";

/// Load and validate the effective configuration.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<AnalysisConfig> {
    if let Some(path) = explicit {
        anyhow::ensure!(path.exists(), "config file {} not found", path.display());
        return read_config(path);
    }

    match discover(cwd, dirs::config_dir().as_deref()) {
        Some(path) => read_config(&path),
        None => {
            debug!("no config file found, using defaults");
            Ok(AnalysisConfig::default())
        }
    }
}

fn discover(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }
    let user = config_dir?.join("callnet/config.toml");
    user.is_file().then_some(user)
}

fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<AnalysisConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}
