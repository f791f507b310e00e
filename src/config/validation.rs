//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{DatabaseConfig, FileSettings, LoggerSettings, Settings, StoreBackend};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - Postgres requires a `postgres://` or `postgresql://` URL
    /// - Max connections must be greater than 0
    /// - Min connections must not exceed max connections
    ///
    /// The memory backend ignores the pool settings but they are still
    /// checked so switching backends never surfaces a latent error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Postgres {
            match self.url.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(ConfigError::invalid(
                        "database.url",
                        "Database URL is required for the postgres backend.",
                    ));
                }
                Some(url) if !is_valid_postgres_url(url) => {
                    return Err(ConfigError::invalid(
                        "database.url",
                        "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
                    ));
                }
                Some(_) => {}
            }
        }

        if self.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::invalid(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

fn is_valid_postgres_url(url: &str) -> bool {
    ["postgres://", "postgresql://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::invalid(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first error
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
