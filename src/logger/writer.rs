//! Log file writer

use std::fs::{File, OpenOptions};
use std::sync::Arc;

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;

/// Open the configured log file, creating parent directories as needed.
///
/// `Arc<File>` is a `MakeWriter` for `tracing_subscriber`, so the result can
/// be handed straight to `fmt::layer().with_writer(..)`.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Arc<File>, LoggerError> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    Ok(Arc::new(options.open(&config.path)?))
}
