//! Configuration management for srpminfo

pub mod schema;

pub use schema::Config;

use crate::error::{SrpmError, SrpmResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("srpminfo")
            .join("config.toml")
    }

    /// The path this manager reads from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration, falling back to defaults when no file exists
    pub async fn load(&self) -> SrpmResult<Config> {
        if !self.config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.config_path).await.map_err(|e| {
            SrpmError::io(
                format!("reading config {}", self.config_path.display()),
                e,
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| SrpmError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Loaded config from {}", self.config_path.display());
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
