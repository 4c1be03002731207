//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a JSON document on disk.  Missing
//! fields take their defaults; the loaded config is validated before it
//! is returned.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::TapConfig;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the file, or fall back to defaults when it does not exist.
    pub fn load_or_default(&self) -> Result<TapConfig, ConfigError> {
        match self.load() {
            Err(ConfigError::NotFound) => {
                info!("CONFIG | {} not found, using defaults", self.path.display());
                Ok(TapConfig::default())
            }
            other => other,
        }
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<TapConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => {
                warn!("CONFIG | read {} failed: {}", self.path.display(), e);
                ConfigError::IoError
            }
        })?;
        let config: TapConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("CONFIG | {} is corrupted: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!(
            "CONFIG | loaded {} (tap_id={}, {} increments @ {} ms)",
            self.path.display(),
            config.tap_id,
            config.pour_profile.len(),
            config.pour_interval_ms,
        );
        Ok(config)
    }
}
