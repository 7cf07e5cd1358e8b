//! Configuration for chunked voice-cloning synthesis
//!
//! Supports loading from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (`VIETVOICE__SYNTHESIS__SPEED=1.1`)
//! - Code defaults

pub mod constants;
pub mod settings;
pub mod synthesis;

pub use settings::{
    load_settings, LogFormat, ModelPaths, ObservabilityConfig, Settings, VoiceCatalogConfig,
};
pub use synthesis::SynthesisConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for vietvoice_core::Error {
    fn from(err: ConfigError) -> Self {
        vietvoice_core::Error::Config(err.to_string())
    }
}
