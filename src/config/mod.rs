//! Configuration for the store engine and the logger.
//!
//! Settings are merged from TOML layers and `REPOKIT_*` environment
//! variables by [`ConfigLoader`]; see the loader module for precedence.
//!
//! ```toml
//! [database]
//! backend = "memory"
//!
//! [logger]
//! level = "info"
//! ```

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::{ConfigLoader, Source};
pub use settings::{DatabaseConfig, LoggerSettings, Settings, StoreBackend};

/// Load settings using the `REPOKIT_*` environment to locate the sources.
pub fn load_settings() -> Result<Settings, ConfigError> {
    ConfigLoader::from_env()?.load()
}
