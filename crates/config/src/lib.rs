//! Configuration management for finlit
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`FINLIT__` prefix, `__` separator)
//! - Hard-coded defaults for anything left unset
//!
//! Settings are resolved once at process start.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, AnalyticsConfig, ChatConfig, ClientConfig, LogFormat, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, StorageConfig, TaxRegime, TaxSettings,
    TaxSlabConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
