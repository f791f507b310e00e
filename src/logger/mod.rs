//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output in Full, Compact or JSON format
//!
//! Library code only emits `tracing` events; applications embedding the
//! repositories call [`init_logger`] once at startup (or install their own
//! subscriber).

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level` when set.
/// Returns [`LoggerError::AlreadyInitialized`] if a global subscriber exists.
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = build_filter(&config.directives()?);
    let layers = build_layers(&config)?;

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    Ok(())
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

// File layer must come before the console layer so ANSI codes from the
// console formatter never leak into span fields written to the file
// (tokio-rs/tracing#1817).
fn build_layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>, LoggerError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    if layers.is_empty() {
        return Err(LoggerError::config(
            "At least one output (console or file) must be enabled",
        ));
    }
    Ok(layers)
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = writer::open_log_file(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };
    Ok(layer)
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}
