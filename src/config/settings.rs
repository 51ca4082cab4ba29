//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;

/// File holding the persisted destination list.
const DIRECTORIES_FILE: &str = "directories.txt";

/// File holding the persisted monitored path.
const MONITORED_PATH_FILE: &str = "monitored_path.txt";

/// Main configuration for dropsort.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for persisted state.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Per-user data directory, `./.dropsort` when the platform has none.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from(".dropsort"), |dir| dir.join("dropsort"))
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::config("data_dir cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Path of the persisted destination list.
    #[must_use]
    pub fn directories_file(&self) -> PathBuf {
        self.data_dir.join(DIRECTORIES_FILE)
    }

    /// Path of the persisted monitored directory.
    #[must_use]
    pub fn monitored_path_file(&self) -> PathBuf {
        self.data_dir.join(MONITORED_PATH_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_data_dir() {
        let config = Config {
            data_dir: PathBuf::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("data_dir"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_store_files() {
        let config = Config {
            data_dir: PathBuf::from("/var/lib/dropsort"),
            ..Default::default()
        };
        assert_eq!(
            config.directories_file(),
            PathBuf::from("/var/lib/dropsort/directories.txt")
        );
        assert_eq!(
            config.monitored_path_file(),
            PathBuf::from("/var/lib/dropsort/monitored_path.txt")
        );
    }
}
