//! Configuration management for queuesweep
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use queuesweep::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Polling {} every {}", config.server.base_url, config.sweep.poll_interval);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `QUEUESWEEP__<section>__<key>`
//!
//! Examples:
//! - `QUEUESWEEP__SERVER__BASE_URL=http://sonarr:8989`
//! - `QUEUESWEEP__SWEEP__POLL_INTERVAL=5m`
//! - `QUEUESWEEP__SWEEP__DRY_RUN=true`
//!
//! The API key is read from `QUEUESWEEP_API_KEY` (or `SONARR_API_KEY`).
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/queuesweep.toml`.
//! This can be overridden using the `QUEUESWEEP_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, ServerConfig, SweepConfig, TelemetryConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`QUEUESWEEP__*`, `QUEUESWEEP_API_KEY`)
    /// 2. TOML file (default: `config/queuesweep.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(sources::default_path())
    }

    /// Load configuration from a specific path, still honouring the environment
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
