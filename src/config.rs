//! Environment configuration shared by the CLI and the API server.
//!
//! | variable        | default       |
//! |-----------------|---------------|
//! | `SWIFT_DB_PATH` | required      |
//! | `API_PORT`      | `8080`        |
//! | `SWIFTAPI_ENV`  | `development` |
//!
//! Before reading them, the binaries load a dotenv file picked by
//! `SWIFTAPI_ENV`: `.env` in production, `.env.<env>.local` otherwise.
//! Variables already set in the process win over the file.

use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use std::str::FromStr;

pub const DB_PATH_VAR: &str = "SWIFT_DB_PATH";
pub const API_PORT_VAR: &str = "API_PORT";
pub const ENV_VAR: &str = "SWIFTAPI_ENV";

pub const DEFAULT_API_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }
}

impl Environment {
    /// Read `SWIFTAPI_ENV` from the process, defaulting to development
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => {
                raw.trim().parse().map_err(|reason| ConfigError::Invalid {
                    key: ENV_VAR,
                    value: raw.clone(),
                    reason,
                })
            }
            _ => Ok(Environment::default()),
        }
    }

    /// Dotenv file this environment reads its settings from
    pub fn env_file_name(&self) -> String {
        match self {
            Environment::Production => ".env".to_string(),
            other => format!(".env.{}.local", other),
        }
    }
}

/// Load the dotenv file for `environment` from `dir` into the process
/// environment. A missing file is not an error; returns the path loaded.
pub fn load_env_file_for(
    dir: &Path,
    environment: Environment,
) -> Result<Option<PathBuf>, ConfigError> {
    let path = dir.join(environment.env_file_name());
    if !path.is_file() {
        debug!(path = %path.display(), "No env file");
        return Ok(None);
    }

    dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), %environment, "Loaded env file");

    Ok(Some(path))
}

/// Load the dotenv file selected by `SWIFTAPI_ENV` from `dir`
pub fn load_env_file(dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    load_env_file_for(dir, Environment::from_env()?)
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "testing" => Ok(Environment::Testing),
            "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment \"{}\"", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_port: u16,
    pub environment: Environment,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = get(DB_PATH_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DB_PATH_VAR))?;

        let api_port = match get(API_PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: API_PORT_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_API_PORT,
        };

        let environment = match get(ENV_VAR) {
            Some(raw) => raw.trim().parse::<Environment>().map_err(|reason| ConfigError::Invalid {
                key: ENV_VAR,
                value: raw.clone(),
                reason,
            })?,
            None => Environment::default(),
        };

        Ok(Config {
            db_path,
            api_port,
            environment,
        })
    }

    /// Address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(DB_PATH_VAR, "/tmp/swift.db")])).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/swift.db"));
        assert_eq!(config.api_port, DEFAULT_API_PORT);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_all_values() {
        let config = Config::from_lookup(lookup(&[
            (DB_PATH_VAR, "swift.db"),
            (API_PORT_VAR, "3000"),
            (ENV_VAR, "production"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 3000);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_missing_db_path() {
        let err = Config::from_lookup(lookup(&[(DB_PATH_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(DB_PATH_VAR)));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[(DB_PATH_VAR, "swift.db"), (API_PORT_VAR, "99999")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: API_PORT_VAR, .. }));
    }

    #[test]
    fn test_invalid_environment() {
        let err = Config::from_lookup(lookup(&[(DB_PATH_VAR, "swift.db"), (ENV_VAR, "staging")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_VAR, .. }));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_env_file_names() {
        assert_eq!(Environment::Development.env_file_name(), ".env.development.local");
        assert_eq!(Environment::Testing.env_file_name(), ".env.testing.local");
        assert_eq!(Environment::Production.env_file_name(), ".env");
    }

    #[test]
    fn test_load_env_file_picks_environment_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SWIFT_REGISTRY_FROM_PROD_FILE=prod\n").unwrap();
        std::fs::write(
            dir.path().join(".env.testing.local"),
            "SWIFT_REGISTRY_FROM_TESTING_FILE=testing\n",
        )
        .unwrap();

        let loaded = load_env_file_for(dir.path(), Environment::Testing).unwrap();

        assert_eq!(loaded, Some(dir.path().join(".env.testing.local")));
        assert_eq!(
            std::env::var("SWIFT_REGISTRY_FROM_TESTING_FILE").as_deref(),
            Ok("testing")
        );
        assert!(std::env::var("SWIFT_REGISTRY_FROM_PROD_FILE").is_err());
    }

    #[test]
    fn test_load_env_file_production() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SWIFT_REGISTRY_PROD_ONLY=prod\n").unwrap();

        let loaded = load_env_file_for(dir.path(), Environment::Production).unwrap();

        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(std::env::var("SWIFT_REGISTRY_PROD_ONLY").as_deref(), Ok("prod"));
    }

    #[test]
    fn test_missing_env_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            load_env_file_for(dir.path(), Environment::Development).unwrap(),
            None
        );
    }
}
