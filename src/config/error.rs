//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration file is missing
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The merged sources do not deserialize into `Settings`
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A setting holds a value the store or logger cannot use
    #[error("Invalid setting {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Both a configuration directory and a single file were requested
    #[error("Conflicting configuration sources: {0}")]
    ConflictingSources(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    /// Dotted key of the offending setting, for `Invalid` errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}
