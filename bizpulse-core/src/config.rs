//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/bizpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/bizpulse/` (~/.config/bizpulse/)
//! - Data: `$XDG_DATA_HOME/bizpulse/` (~/.local/share/bizpulse/)
//! - State/Logs: `$XDG_STATE_HOME/bizpulse/` (~/.local/state/bizpulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics rates and thresholds
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Time tracking defaults
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Rates and thresholds used by the analytics engine.
///
/// The two cost rates are display placeholders rather than a real cost model.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Estimated cost per non-billable hour
    #[serde(default = "default_non_billable_cost_rate")]
    pub non_billable_cost_rate: f64,

    /// Estimated cost per overtime hour
    #[serde(default = "default_overtime_cost_rate")]
    pub overtime_cost_rate: f64,

    /// A single entry longer than this counts the excess as overtime
    #[serde(default = "default_overtime_threshold_hours")]
    pub overtime_threshold_hours: f64,

    /// Length of the top-projects and top-variance rankings
    #[serde(default = "default_top_projects_count")]
    pub top_projects_count: usize,

    /// Length of the top-clients ranking
    #[serde(default = "default_top_clients_count")]
    pub top_clients_count: usize,

    /// Overdue percentage above which a task bottleneck is flagged
    #[serde(default = "default_overdue_bottleneck_percent")]
    pub overdue_bottleneck_percent: f64,

    /// Quarter revenue above `mean * ratio` is a peak
    #[serde(default = "default_seasonal_peak_ratio")]
    pub seasonal_peak_ratio: f64,

    /// Quarter revenue below `mean * ratio` is a low
    #[serde(default = "default_seasonal_low_ratio")]
    pub seasonal_low_ratio: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            non_billable_cost_rate: default_non_billable_cost_rate(),
            overtime_cost_rate: default_overtime_cost_rate(),
            overtime_threshold_hours: default_overtime_threshold_hours(),
            top_projects_count: default_top_projects_count(),
            top_clients_count: default_top_clients_count(),
            overdue_bottleneck_percent: default_overdue_bottleneck_percent(),
            seasonal_peak_ratio: default_seasonal_peak_ratio(),
            seasonal_low_ratio: default_seasonal_low_ratio(),
        }
    }
}

impl AnalyticsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.overtime_threshold_hours <= 0.0 {
            return Err(Error::Config(
                "analytics.overtime_threshold_hours must be positive".to_string(),
            ));
        }
        if self.non_billable_cost_rate < 0.0 || self.overtime_cost_rate < 0.0 {
            return Err(Error::Config(
                "analytics cost rates must not be negative".to_string(),
            ));
        }
        if self.top_projects_count == 0 || self.top_clients_count == 0 {
            return Err(Error::Config(
                "analytics.top_projects_count and top_clients_count must be at least 1"
                    .to_string(),
            ));
        }
        if self.seasonal_low_ratio <= 0.0 || self.seasonal_low_ratio >= self.seasonal_peak_ratio {
            return Err(Error::Config(
                "analytics.seasonal_low_ratio must be positive and below seasonal_peak_ratio"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn default_non_billable_cost_rate() -> f64 {
    50.0
}

fn default_overtime_cost_rate() -> f64 {
    75.0
}

fn default_overtime_threshold_hours() -> f64 {
    8.0
}

fn default_top_projects_count() -> usize {
    5
}

fn default_top_clients_count() -> usize {
    5
}

fn default_overdue_bottleneck_percent() -> f64 {
    20.0
}

fn default_seasonal_peak_ratio() -> f64 {
    1.2
}

fn default_seasonal_low_ratio() -> f64 {
    0.8
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Time tracking defaults
#[derive(Debug, Deserialize)]
pub struct TrackingConfig {
    /// User ID recorded on time entries when none is given
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

fn default_user_id() -> String {
    "me".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/bizpulse/config.toml` (~/.config/bizpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("bizpulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/bizpulse/` (~/.local/share/bizpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("bizpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/bizpulse/` (~/.local/state/bizpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("bizpulse")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/bizpulse/data.db` (~/.local/share/bizpulse/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/bizpulse/bizpulse.log` (~/.local/state/bizpulse/bizpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("bizpulse.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.non_billable_cost_rate, 50.0);
        assert_eq!(config.analytics.overtime_cost_rate, 75.0);
        assert_eq!(config.analytics.overtime_threshold_hours, 8.0);
        assert_eq!(config.analytics.top_projects_count, 5);
        assert_eq!(config.tracking.default_user_id, "me");
        assert!(config.analytics.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
overtime_threshold_hours = 10
top_projects_count = 3

[logging]
level = "debug"

[tracking]
default_user_id = "alex"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.overtime_threshold_hours, 10.0);
        assert_eq!(config.analytics.top_projects_count, 3);
        // Unset fields keep their defaults
        assert_eq!(config.analytics.top_clients_count, 5);
        assert_eq!(config.analytics.seasonal_peak_ratio, 1.2);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.tracking.default_user_id, "alex");
    }

    #[test]
    fn test_analytics_config_validation() {
        let config = AnalyticsConfig {
            overtime_threshold_hours: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            seasonal_low_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            top_projects_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            top_clients_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_analytics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\nnon_billable_cost_rate = -1\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
