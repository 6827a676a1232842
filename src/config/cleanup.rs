//! Grace-period cleanup configuration.
//!
//! # Example
//!
//! ```toml
//! [cleanup]
//! enabled = true
//! interval_hours = 24
//! grace_period_days = 30
//!
//! [cleanup.safety]
//! dry_run = false
//! max_erasures_per_run = 1000
//! ```

use serde::{Deserialize, Serialize};

/// Controls the scheduled erasure of withdrawn accounts.
///
/// The grace period is read here when a withdrawal happens; the deadline it
/// produces is stored on the account, so changing the configuration later
/// never moves deadlines already in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Whether the background cleanup worker runs.
    /// Default: false (must be explicitly enabled)
    #[serde(default)]
    pub enabled: bool,

    /// How often the worker runs (in hours).
    /// Default: 24 (once per day)
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Days a withdrawn account stays restorable before becoming erasable.
    /// Zero is legal and means withdrawn accounts are immediately erasable.
    /// Default: 30
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,

    /// Safety settings to prevent accidental data loss.
    #[serde(default)]
    pub safety: CleanupSafety,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: default_interval_hours(),
            grace_period_days: default_grace_period_days(),
            safety: CleanupSafety::default(),
        }
    }
}

fn default_interval_hours() -> u64 {
    24
}

fn default_grace_period_days() -> i64 {
    30
}

/// Safety settings for erasure runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupSafety {
    /// If true, log which accounts would be erased without erasing them.
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum accounts erased per run. Set to 0 for unlimited.
    /// Default: 1000
    #[serde(default = "default_max_erasures_per_run")]
    pub max_erasures_per_run: u64,

    /// How many erasable accounts to fetch per query.
    /// Default: 500
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for CleanupSafety {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_erasures_per_run: default_max_erasures_per_run(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_max_erasures_per_run() -> u64 {
    1000
}

fn default_batch_size() -> u32 {
    500
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.grace_period_days < 0 {
            return Err(format!(
                "cleanup.grace_period_days must be >= 0, got {}",
                self.grace_period_days
            ));
        }
        if self.interval_hours == 0 {
            return Err("cleanup.interval_hours must be >= 1".to_string());
        }
        if self.safety.batch_size == 0 {
            return Err("cleanup.safety.batch_size must be >= 1".to_string());
        }
        Ok(())
    }

    /// Get the interval as a Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_hours * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleanupConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval_hours, 24);
        assert_eq!(config.grace_period_days, 30);
        assert!(!config.safety.dry_run);
        assert_eq!(config.safety.max_erasures_per_run, 1000);
        assert_eq!(config.safety.batch_size, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_grace_period_is_valid() {
        let config = CleanupConfig {
            grace_period_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_duration() {
        let mut config = CleanupConfig::default();
        assert_eq!(config.interval(), std::time::Duration::from_secs(24 * 3600));

        config.interval_hours = 6;
        assert_eq!(config.interval(), std::time::Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            enabled = true
        "#;
        let config: CleanupConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.grace_period_days, 30);
    }
}
