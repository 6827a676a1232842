//! Process configuration, loaded from TOML at startup.
//!
//! Configuration errors are fatal: a config that parses but fails
//! `validate()` (negative grace period, zero interval) stops the process
//! before any worker starts.

mod cleanup;
mod database;

use std::path::Path;

pub use cleanup::{CleanupConfig, CleanupSafety};
pub use database::DatabaseConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl LifecycleConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;
        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LifecycleConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate().map_err(ConfigError::Validation)?;
        self.cleanup.validate().map_err(ConfigError::Validation)?;
        Ok(())
    }
}

/// Console logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log filter directive, e.g. "info" or "huddle_lifecycle=debug".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LifecycleConfig::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.cleanup.grace_period_days, 30);
        assert!(!config.cleanup.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [database]
            path = "lifecycle.db"
            max_connections = 8

            [logging]
            level = "debug"
            format = "json"

            [cleanup]
            enabled = true
            interval_hours = 6
            grace_period_days = 14

            [cleanup.safety]
            dry_run = true
            max_erasures_per_run = 200
            batch_size = 50
        "#;
        let config = LifecycleConfig::from_str(toml).unwrap();
        assert_eq!(config.database.path, "lifecycle.db");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.cleanup.enabled);
        assert_eq!(config.cleanup.interval_hours, 6);
        assert_eq!(config.cleanup.grace_period_days, 14);
        assert!(config.cleanup.safety.dry_run);
        assert_eq!(config.cleanup.safety.max_erasures_per_run, 200);
        assert_eq!(config.cleanup.safety.batch_size, 50);
    }

    #[test]
    fn test_negative_grace_period_is_fatal() {
        let toml = r#"
            [cleanup]
            grace_period_days = -1
        "#;
        let err = LifecycleConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_interval_is_fatal() {
        let toml = r#"
            [cleanup]
            interval_hours = 0
        "#;
        let err = LifecycleConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = LifecycleConfig::from_str("retention_days = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
