//! Deployment environment, selects the `{environment}.toml` layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

/// Accepted spellings, matched case-insensitively
const ALIASES: &[(&str, Environment)] = &[
    ("development", Environment::Development),
    ("dev", Environment::Development),
    ("test", Environment::Test),
    ("production", Environment::Production),
    ("prod", Environment::Production),
];

impl Environment {
    pub const ENV_VAR: &'static str = "REPOKIT_APP_ENV";

    /// Read `REPOKIT_APP_ENV`, falling back to `Development` when it is unset.
    ///
    /// An unrecognised value is an error rather than a silent fallback, so a
    /// typo never loads development settings against a production store.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Self::default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// File name of this environment's configuration layer.
    pub fn file_name(&self) -> String {
        format!("{}.toml", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, env)| *env)
            .ok_or_else(|| {
                ConfigError::UnknownEnvironment(format!(
                    "'{}' (expected development, test or production)",
                    s
                ))
            })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve() {
        for (alias, expected) in ALIASES {
            assert_eq!(alias.parse::<Environment>().unwrap(), *expected);
        }
        assert_eq!(" Prod ".parse::<Environment>().unwrap(), Environment::Production);
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        match "staging".parse::<Environment>() {
            Err(ConfigError::UnknownEnvironment(msg)) => assert!(msg.contains("staging")),
            other => panic!("Expected UnknownEnvironment, got: {:?}", other),
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for env in [Environment::Development, Environment::Test, Environment::Production] {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
    }

    #[test]
    fn test_layer_file_name() {
        assert_eq!(Environment::Test.file_name(), "test.toml");
        assert_eq!(Environment::default().file_name(), "development.toml");
    }
}
