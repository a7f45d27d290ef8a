//! Configuration management for recordkeeper.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::str::FromStr;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name used under the platform config directory.
const APP_DIR_NAME: &str = "recordkeeper";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "RECORDKEEPER_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RECORDKEEPER_`, `__` between
///    section and key, e.g. `RECORDKEEPER_AUTH__MAX_LOGIN_ATTEMPTS=5`)
/// 2. TOML config file at `~/.config/recordkeeper/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data file locations.
    pub storage: StorageConfig,
    /// Login and account settings.
    pub auth: AuthConfig,
    /// Log sink settings.
    pub logging: LoggingConfig,
}

/// Data file locations.
///
/// Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// CSV file holding person records.
    pub people_path: PathBuf,
    /// Flat file holding `username,password,is_active` lines.
    pub users_path: PathBuf,
}

/// Login and account settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Failed attempts per username before lockout, and prompts per session.
    pub max_login_attempts: u32,
    /// Store newly written passwords as salted BLAKE3 digests.
    pub hash_passwords: bool,
}

/// Log sink settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only log file.
    pub log_path: PathBuf,
    /// Minimum level written to the log file.
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            people_path: PathBuf::from("people.csv"),
            users_path: PathBuf::from("Users.txt"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 3,
            hash_passwords: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("log.txt"),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured file log level.
    ///
    /// # Errors
    ///
    /// Returns an error if the level name is not recognised.
    pub fn file_level(&self) -> Result<Level> {
        Level::from_str(self.level.trim()).map_err(|_| {
            Error::config_validation(format!("unknown log level: {}", self.level))
        })
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth.max_login_attempts == 0 {
            return Err(Error::config_validation(
                "max_login_attempts must be greater than 0",
            ));
        }

        if self.storage.people_path.as_os_str().is_empty() {
            return Err(Error::config_validation("people_path must not be empty"));
        }

        if self.storage.users_path.as_os_str().is_empty() {
            return Err(Error::config_validation("users_path must not be empty"));
        }

        if self.storage.people_path == self.storage.users_path {
            return Err(Error::config_validation(format!(
                "people_path and users_path must differ ({})",
                self.storage.people_path.display()
            )));
        }

        if self.logging.log_path.as_os_str().is_empty() {
            return Err(Error::config_validation("log_path must not be empty"));
        }

        self.logging.file_level()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.people_path, PathBuf::from("people.csv"));
        assert_eq!(config.storage.users_path, PathBuf::from("Users.txt"));
        assert_eq!(config.auth.max_login_attempts, 3);
        assert!(!config.auth.hash_passwords);
        assert_eq!(config.logging.log_path, PathBuf::from("log.txt"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.auth.max_login_attempts = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_login_attempts"));
    }

    #[test]
    fn test_validate_same_data_files() {
        let mut config = Config::default();
        config.storage.users_path = config.storage.people_path.clone();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("must differ"));
    }

    #[test]
    fn test_validate_empty_log_path() {
        let mut config = Config::default();
        config.logging.log_path = PathBuf::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("log_path"));
    }

    #[test]
    fn test_validate_unknown_level() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown log level"));
    }

    #[test]
    fn test_file_level_parses_case_insensitively() {
        let logging = LoggingConfig {
            level: "WARN".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(logging.file_level().unwrap(), Level::WARN);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("recordkeeper"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[auth]\nmax_login_attempts = 5\n\n[storage]\npeople_path = \"clients.csv\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.auth.max_login_attempts, 5);
        assert_eq!(config.storage.people_path, PathBuf::from("clients.csv"));
        assert_eq!(config.storage.users_path, PathBuf::from("Users.txt"));
    }

    #[test]
    fn test_load_reads_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[auth]\nhash_passwords = true\n\n[logging]\nlog_path = \"logs/rk.log\"\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!(config.auth.hash_passwords);
        assert_eq!(config.auth.max_login_attempts, 3);
        assert_eq!(config.logging.log_path, PathBuf::from("logs/rk.log"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nmax_login_attempts = 0\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("max_login_attempts"));
        assert!(json.contains("people_path"));
    }
}
