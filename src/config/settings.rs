//! Configuration settings structures for repokit
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/repokit.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Store backend selected by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process dashmap store, lost on exit
    #[default]
    Memory,
    /// PostgreSQL through diesel-async and bb8
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend to build
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database connection URL (postgres only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections kept in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Postgres settings for `url` with pool defaults
    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Postgres,
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Logger Configuration
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = self.console.into_console_config();
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::Invalid {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl ConsoleSettings {
    pub fn into_console_config(self) -> ConsoleConfig {
        ConsoleConfig::new(self.enabled, self.colored)
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::Invalid {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }

    fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::Invalid {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Engine configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}
