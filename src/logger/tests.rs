//! Tests for the logger module

use crate::logger::config::*;
use std::path::PathBuf;

#[cfg(test)]
mod config_tests {
    use super::*;

    fn create_test_config() -> LoggerConfig {
        LoggerConfig {
            console: ConsoleConfig {
                enabled: true,
                colored: false,
            },
            file: FileConfig {
                enabled: false,
                path: PathBuf::from("test.log"),
                append: true,
                format: LogFormat::Full,
            },
            level: "info".to_string(),
        }
    }

    #[test]
    fn test_default_config_creation() {
        let config = LoggerConfig::default();
        assert!(config.console.enabled);
        assert!(config.console.colored);
        assert!(!config.file.enabled);
        assert_eq!(config.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = create_test_config();
        assert!(config.validate().is_ok());

        config.console.enabled = false;
        config.file.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_test_config();
        config.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_parse_level_is_case_insensitive() {
        let mut config = create_test_config();
        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_directives_cap_driver_targets() {
        let mut config = create_test_config();
        config.level = "debug".to_string();
        assert_eq!(
            config.directives().unwrap(),
            "debug,tokio_postgres=warn,bb8=warn"
        );

        config.level = "error".to_string();
        assert_eq!(config.directives().unwrap(), "error");
    }

    #[test]
    fn test_enabled_file_requires_path() {
        let result = FileConfig::new(true, PathBuf::new(), true, LogFormat::Json);
        assert!(result.is_err());

        let disabled = FileConfig::new(false, PathBuf::new(), true, LogFormat::Json);
        assert!(disabled.is_ok());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::default(), LogFormat::Full);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Compact.as_str(), "compact");
    }

    #[test]
    fn test_builder_defaults_and_overrides() {
        let config = LoggerConfigBuilder::new().level("warn").build().unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.file, FileConfig::default());

        let result = LoggerConfigBuilder::new()
            .console(ConsoleConfig::new(false, false))
            .build();
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod writer_tests {
    use super::*;
    use crate::logger::writer::open_log_file;
    use std::io::Write;
    use tempfile::tempdir;

    fn file_config(path: PathBuf, append: bool) -> FileConfig {
        FileConfig {
            enabled: true,
            path,
            append,
            format: LogFormat::Json,
        }
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");

        let file = open_log_file(&file_config(path.clone(), true)).unwrap();
        (&*file).write_all(b"hello\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "first\n").unwrap();

        let file = open_log_file(&file_config(path.clone(), true)).unwrap();
        (&*file).write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "stale\n").unwrap();

        let file = open_log_file(&file_config(path.clone(), false)).unwrap();
        (&*file).write_all(b"fresh\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
