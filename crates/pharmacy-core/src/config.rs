//! Engine configuration.
//!
//! Layered: built-in defaults, then an optional config file, then
//! `PHARMACY_*` environment variables (e.g. `PHARMACY_BUSY_TIMEOUT_MS`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "pharmacy.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum EngineConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings for the pharmacy core.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: String,
    /// How long a writer waits for a held lock before failing
    pub busy_timeout_ms: u64,
    /// Page size used by audit queries that do not specify one
    pub default_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load from defaults and the environment.
    pub fn load() -> Result<Self, EngineConfigError> {
        Self::load_from(None)
    }

    /// Load from defaults, an optional file, and the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, EngineConfigError> {
        let mut builder = Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("busy_timeout_ms", DEFAULT_BUSY_TIMEOUT_MS as i64)?
            .set_default("default_page_size", DEFAULT_PAGE_SIZE as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix("PHARMACY").try_parsing(true))
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(EngineConfigError::Invalid(
                "database_path must not be empty".into(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(EngineConfigError::Invalid(
                "default_page_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
