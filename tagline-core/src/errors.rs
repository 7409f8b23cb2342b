use std::io;

use thiserror::Error;

/// Result type used across the Tagline core crate.
pub type Result<T> = std::result::Result<T, TaglineError>;

/// Canonical error representation shared by all services.
#[derive(Debug, Error)]
pub enum TaglineError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("rule violation: {0}")]
    RuleViolation(String),

    #[error("event processing error: {0}")]
    EventProcessingError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for TaglineError {
    fn from(err: serde_json::Error) -> Self {
        TaglineError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for TaglineError {
    fn from(value: ConfigError) -> Self {
        TaglineError::ConfigError(value.to_string())
    }
}
