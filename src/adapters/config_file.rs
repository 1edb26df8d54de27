//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a JSON document on the host filesystem.
//! A missing file yields the defaults; a present but unreadable or
//! invalid file is an error, never silently replaced.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use crate::error::Error;

/// Config source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse and validate a JSON document.
    pub fn parse(text: &str) -> Result<SystemConfig, ConfigError> {
        let cfg: SystemConfig = serde_json::from_str(text).map_err(|e| {
            warn!("config parse error: {e}");
            ConfigError::Corrupted
        })?;
        cfg.validate().map_err(|e| match e {
            Error::Config(msg) => ConfigError::ValidationFailed(msg),
            _ => ConfigError::ValidationFailed("invalid config"),
        })?;
        Ok(cfg)
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{}: no config file, using defaults", self.path.display());
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("{}: {e}", self.path.display());
                return Err(ConfigError::IoError);
            }
        };
        let cfg = Self::parse(&text)?;
        info!("{}: loaded config", self.path.display());
        Ok(cfg)
    }
}
