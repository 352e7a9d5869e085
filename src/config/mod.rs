//! Configuration management for teamster
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. A TOML or JSON configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use teamster::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Serving {} on {}", config.image_dir.display(), config.bind_addr());
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `TEAMSTER__<KEY>`, e.g.
//! `TEAMSTER__PORT=7000` or `TEAMSTER__TEAMS_VERSION=1`.
//!
//! # Configuration File
//!
//! By default the file is `$XDG_CONFIG_DIR/teamster/config.toml`, falling back
//! to the platform config directory. Relative image and thumbnail directories
//! are resolved against the directory holding the file.

mod models;
mod sources;
mod validation;

pub use models::Config;
pub use sources::{config_base_dir, default_config_path, log_config_source};
pub use validation::ValidationError;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to determine base directory: {0}")]
    BaseDirError(#[from] std::io::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// `path` overrides the default config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (zero thumbnail size, unsupported teams version, ...)
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(default_config_path);
        let mut config = sources::load(&path)?;
        config.resolve_dirs(&base_dir_for(&path)?);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, skipping `.env`
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(&path)?;
        config.resolve_dirs(&base_dir_for(&path)?);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Makes relative directories absolute against `base`.
    pub fn resolve_dirs(&mut self, base: &Path) {
        if self.image_dir.is_relative() {
            self.image_dir = base.join(&self.image_dir);
        }
        if self.thumbnail_dir.is_relative() {
            self.thumbnail_dir = base.join(&self.thumbnail_dir);
        }
    }
}

/// Directory of the config file when it exists, otherwise the working directory.
fn base_dir_for(config_path: &Path) -> Result<PathBuf, std::io::Error> {
    let cwd = std::env::current_dir()?;
    match config_path.parent() {
        Some(parent) if config_path.exists() => Ok(cwd.join(parent)),
        _ => Ok(cwd),
    }
}
