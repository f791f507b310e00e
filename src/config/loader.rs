//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml` (optional)
//! 3. `local.toml` (optional)
//! 4. `REPOKIT_*` environment variables, `__` separating nested keys
//!
//! `REPOKIT_CONFIG_FILE` replaces steps 1-3 with a single required file.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};

use crate::config::environment::Environment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "REPOKIT_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "REPOKIT_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "REPOKIT";
const ENV_SEPARATOR: &str = "__";

/// Where the file layers come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `default.toml`, `{environment}.toml` and `local.toml` under a directory
    Layered { dir: PathBuf, environment: Environment },
    /// One file holding every setting
    Single(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: Source,
    env_overrides: bool,
}

impl ConfigLoader {
    /// Loader configured from `REPOKIT_CONFIG_DIR`, `REPOKIT_CONFIG_FILE`
    /// and `REPOKIT_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Fails when both the directory and the file variables are set, or when
    /// the environment name is not recognised.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dir = std::env::var(CONFIG_DIR_ENV).ok();
        let file = std::env::var(CONFIG_FILE_ENV).ok();

        let source = match (dir, file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingSources(format!(
                    "{} and {} cannot both be set",
                    CONFIG_DIR_ENV, CONFIG_FILE_ENV
                )));
            }
            (_, Some(file)) => Source::Single(PathBuf::from(file)),
            (dir, None) => Source::Layered {
                dir: PathBuf::from(dir.unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string())),
                environment: Environment::from_env()?,
            },
        };

        Ok(Self {
            source,
            env_overrides: true,
        })
    }

    pub fn layered(dir: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            source: Source::Layered {
                dir: dir.into(),
                environment,
            },
            env_overrides: true,
        }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Single(path.into()),
            env_overrides: true,
        }
    }

    /// Skip the `REPOKIT_*` variable layer.
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// File layers in merge order with whether each must exist.
    pub fn layers(&self) -> Vec<(PathBuf, bool)> {
        match &self.source {
            Source::Single(path) => vec![(path.clone(), true)],
            Source::Layered { dir, environment } => vec![
                (dir.join("default.toml"), true),
                (dir.join(environment.file_name()), false),
                (dir.join("local.toml"), false),
            ],
        }
    }

    /// Merge every source, deserialize and validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self
            .build()?
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        settings.validate()?;
        tracing::debug!(
            source = ?self.source,
            backend = settings.database.backend.as_str(),
            "Configuration loaded"
        );
        Ok(settings)
    }

    fn build(&self) -> Result<Config, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in self.layers() {
            builder = add_file(builder, &path, required)?;
        }

        if self.env_overrides {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            );
        }

        Ok(builder.build()?)
    }
}

fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.exists() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::StoreBackend;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Environment variables are process-wide; tests touching them run one at a time
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const DEFAULT_CONFIG: &str = r#"
[database]
backend = "memory"
max_connections = 10
min_connections = 1
connection_timeout = 30

[logger]
level = "info"

[logger.console]
enabled = true
colored = true

[logger.file]
enabled = false
"#;

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(dir.path().join(name), content).expect("Failed to write config file");
        }
        dir
    }

    /// Clears the loader's variables for one test and restores them on drop
    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let mut guard = Self { saved: Vec::new() };
            for key in [
                CONFIG_DIR_ENV,
                CONFIG_FILE_ENV,
                Environment::ENV_VAR,
                "REPOKIT_DATABASE__BACKEND",
                "REPOKIT_DATABASE__URL",
                "REPOKIT_DATABASE__MAX_CONNECTIONS",
                "REPOKIT_LOGGER__LEVEL",
            ] {
                guard.saved.push((key.to_string(), std::env::var(key).ok()));
                unsafe { std::env::remove_var(key) };
            }
            guard
        }

        /// Only keys cleared by `clean` are restored
        fn set(&mut self, key: &str, value: &str) {
            unsafe { std::env::set_var(key, value) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                unsafe {
                    match value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_env_defaults() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::clean();

        let loader = ConfigLoader::from_env().unwrap();
        assert_eq!(
            loader.source(),
            &Source::Layered {
                dir: PathBuf::from("config"),
                environment: Environment::Development,
            }
        );
    }

    #[test]
    fn test_from_env_rejects_conflicting_sources() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        env.set(CONFIG_DIR_ENV, "/etc/repokit");
        env.set(CONFIG_FILE_ENV, "/etc/repokit.toml");

        match ConfigLoader::from_env() {
            Err(ConfigError::ConflictingSources(msg)) => {
                assert!(msg.contains(CONFIG_DIR_ENV));
                assert!(msg.contains(CONFIG_FILE_ENV));
            }
            other => panic!("Expected ConflictingSources, got: {:?}", other),
        }
    }

    #[test]
    fn test_from_env_rejects_unknown_environment() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        env.set(Environment::ENV_VAR, "qa");

        assert!(matches!(
            ConfigLoader::from_env(),
            Err(ConfigError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn test_layers_in_merge_order() {
        let loader = ConfigLoader::layered("/cfg", Environment::Test);
        assert_eq!(
            loader.layers(),
            vec![
                (PathBuf::from("/cfg/default.toml"), true),
                (PathBuf::from("/cfg/test.toml"), false),
                (PathBuf::from("/cfg/local.toml"), false),
            ]
        );

        let single = ConfigLoader::single("/cfg/app.toml");
        assert_eq!(single.layers(), vec![(PathBuf::from("/cfg/app.toml"), true)]);
    }

    #[test]
    fn test_missing_default_layer() {
        let dir = config_dir(&[]);
        let result = ConfigLoader::layered(dir.path(), Environment::Development)
            .without_env_overrides()
            .load();

        match result {
            Err(ConfigError::FileNotFound(path)) => assert!(path.ends_with("default.toml")),
            other => panic!("Expected FileNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_optional_layers_may_be_absent() {
        let dir = config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        let settings = ConfigLoader::layered(dir.path(), Environment::Production)
            .without_env_overrides()
            .load()
            .unwrap();

        assert_eq!(settings.database.backend, StoreBackend::Memory);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.logger.level, "info");
    }

    #[test]
    fn test_file_layers_override_in_order() {
        let production = r#"
[database]
backend = "postgres"
url = "postgres://prod/db"
max_connections = 50

[logger]
level = "warn"
"#;
        let local = r#"
[database]
url = "postgres://local/db"
"#;
        let dir = config_dir(&[
            ("default.toml", DEFAULT_CONFIG),
            ("production.toml", production),
            ("local.toml", local),
        ]);

        let settings = ConfigLoader::layered(dir.path(), Environment::Production)
            .without_env_overrides()
            .load()
            .unwrap();

        assert_eq!(settings.database.url.as_deref(), Some("postgres://local/db"));
        assert_eq!(settings.database.backend, StoreBackend::Postgres);
        assert_eq!(settings.database.max_connections, 50);
        assert_eq!(settings.logger.level, "warn");
        assert_eq!(settings.database.min_connections, 1);
    }

    #[test]
    fn test_env_vars_override_files() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        env.set("REPOKIT_DATABASE__BACKEND", "postgres");
        env.set("REPOKIT_DATABASE__URL", "postgres://env/db");
        env.set("REPOKIT_DATABASE__MAX_CONNECTIONS", "4");
        env.set("REPOKIT_LOGGER__LEVEL", "error");

        let dir = config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        let settings = ConfigLoader::layered(dir.path(), Environment::Development)
            .load()
            .unwrap();

        assert_eq!(settings.database.backend, StoreBackend::Postgres);
        assert_eq!(settings.database.url.as_deref(), Some("postgres://env/db"));
        assert_eq!(settings.database.max_connections, 4);
        assert_eq!(settings.logger.level, "error");
    }

    #[test]
    fn test_postgres_without_url_fails_validation() {
        let config = r#"
[database]
backend = "postgres"
"#;
        let dir = config_dir(&[("app.toml", config)]);
        let err = ConfigLoader::single(dir.path().join("app.toml"))
            .without_env_overrides()
            .load()
            .unwrap_err();

        assert_eq!(err.field(), Some("database.url"));
    }

    #[test]
    fn test_single_file_from_env() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();

        let config = r#"
[database]
backend = "postgres"
url = "postgres://single/db"
max_connections = 20
min_connections = 2

[logger]
level = "debug"
"#;
        let dir = config_dir(&[("single.toml", config)]);
        env.set(CONFIG_FILE_ENV, dir.path().join("single.toml").to_str().unwrap());

        let settings = ConfigLoader::from_env().unwrap().load().unwrap();
        assert_eq!(settings.database.url.as_deref(), Some("postgres://single/db"));
        assert_eq!(settings.database.min_connections, 2);
        assert_eq!(settings.logger.level, "debug");
    }
}
