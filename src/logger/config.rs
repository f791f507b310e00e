//! Configuration types for the logger

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Targets that log every statement or checkout at debug level
const QUIET_TARGETS: &[&str] = &["tokio_postgres", "bb8"];

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    /// Default level; `RUST_LOG` directives override it at init
    pub level: String,
}

impl LoggerConfig {
    /// Create a new logger configuration with validation
    pub fn new(console: ConsoleConfig, file: FileConfig, level: String) -> Result<Self> {
        let config = Self {
            console,
            file,
            level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.parse_level()
            .with_context(|| format!("Invalid log level: {}", self.level))?;

        self.file.validate().context("Invalid file configuration")?;

        if !self.console.enabled && !self.file.enabled {
            anyhow::bail!("At least one output (console or file) must be enabled");
        }

        Ok(())
    }

    /// Level as a `tracing::Level`, case-insensitive.
    pub fn parse_level(&self) -> Result<Level> {
        self.level
            .trim()
            .parse::<Level>()
            .map_err(|_| anyhow::anyhow!("expected one of trace, debug, info, warn, error"))
    }

    /// Default `EnvFilter` directives: the configured level everywhere,
    /// with the pool and driver targets capped at `warn`.
    pub fn directives(&self) -> Result<String> {
        let level = self.parse_level()?.as_str().to_lowercase();
        let mut directives = vec![level.clone()];
        if level != "error" {
            directives.extend(QUIET_TARGETS.iter().map(|t| format!("{}=warn", t)));
        }
        Ok(directives.join(","))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            level: "info".to_string(),
        }
    }
}

/// Console output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Only honoured when stdout is a terminal
    pub colored: bool,
}

impl ConsoleConfig {
    pub fn new(enabled: bool, colored: bool) -> Self {
        Self { enabled, colored }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
}

impl FileConfig {
    /// Create a new file configuration with validation
    pub fn new(enabled: bool, path: PathBuf, append: bool, format: LogFormat) -> Result<Self> {
        let config = Self {
            enabled,
            path,
            append,
            format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate file configuration.
    ///
    /// Does not touch the filesystem; directories are created when the file
    /// is opened at init.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.path.as_os_str().is_empty() {
            anyhow::bail!("File path cannot be empty when file output is enabled");
        }
        Ok(())
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/repokit.log"),
            append: true,
            format: LogFormat::Json,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!(
                "Invalid log format '{}'. Valid formats are: full, compact, json",
                s
            ),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

/// Builder for LoggerConfig
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    console: Option<ConsoleConfig>,
    file: Option<FileConfig>,
    level: Option<String>,
}

impl LoggerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn console(mut self, config: ConsoleConfig) -> Self {
        self.console = Some(config);
        self
    }

    pub fn file(mut self, config: FileConfig) -> Self {
        self.file = Some(config);
        self
    }

    pub fn level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn build(self) -> Result<LoggerConfig> {
        LoggerConfig::new(
            self.console.unwrap_or_default(),
            self.file.unwrap_or_default(),
            self.level.unwrap_or_else(|| "info".to_string()),
        )
    }
}
