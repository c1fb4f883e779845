//! Configuration for the TyrePlex backend.
//!
//! Layered loading (defaults file, then an environment file, then
//! `TYREPLEX__`-prefixed environment variables), serde defaults on every
//! field and a `validate()` pass so a bad deployment fails before it
//! serves traffic.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, AgentConfig, CatalogConfig, FeatureFlags, ObservabilityConfig,
    PersistenceConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
