//! Command implementations for the lumberjack CLI

pub mod check;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lumberjack_config::Config;

/// Config file looked for when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["lumberjack.toml", "configs/lumberjack.toml"];

/// Configuration plus the file it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,

    /// `None` when running on defaults
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Where the configuration came from, for log lines
    pub fn source(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string())
    }
}

/// Load configuration
///
/// An explicit path must exist. Without one the default paths are tried in
/// order, falling back to built-in defaults. Validation is left to the
/// command, after its overrides are applied.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let config = Config::read_file(path).context("failed to load configuration")?;
        return Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
        });
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            let config = Config::read_file(path).context("failed to load configuration")?;
            return Ok(LoadedConfig {
                config,
                path: Some(path.to_path_buf()),
            });
        }
    }

    Ok(LoadedConfig {
        config: Config::default(),
        path: None,
    })
}
