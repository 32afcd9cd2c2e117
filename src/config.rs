//! Configuration management for Gridwatch
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The file location can be overridden with the
//! `GRIDWATCH_CONFIG` environment variable.

use crate::error::{GridwatchError, Result};
use crate::grid::DEFAULT_BASE_URL;
use crate::monitor::Offset;
use crate::zip::is_valid_format;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "GRIDWATCH_CONFIG";

/// Default poll interval: ten minutes
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Remote grid status API
    pub api: ApiConfig,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Postal codes to monitor at startup
    pub monitors: Vec<MonitorConfig>,
}

/// Remote API connection parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Whether to start the HTTP API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// A postal code to monitor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonitorConfig {
    /// Five digit postal code
    pub zip: String,

    /// Display name; defaults to "Grid Monitor for <zip>"
    #[serde(default)]
    pub name: Option<String>,

    /// Tracked forecast horizons
    #[serde(default = "default_offsets")]
    pub offsets: Vec<Offset>,
}

fn default_offsets() -> Vec<Offset> {
    Offset::DEFAULT.to_vec()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            user_agent: format!("gridwatch/{}", env!("APP_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/gridwatch.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            monitors: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn new(zip: &str) -> Self {
        Self {
            zip: zip.to_string(),
            name: None,
            offsets: default_offsets(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the environment override or default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }

        let default_paths = [
            "gridwatch_config.yaml",
            "/data/gridwatch_config.yaml",
            "/etc/gridwatch/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(GridwatchError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GridwatchError::validation(
                "api.base_url",
                "Base URL must use http or https",
            ));
        }
        if base.ends_with('/') {
            return Err(GridwatchError::validation(
                "api.base_url",
                "Base URL must not end with a slash",
            ));
        }

        if self.api.timeout_ms == 0 {
            return Err(GridwatchError::validation(
                "api.timeout_ms",
                "Must be greater than 0",
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(GridwatchError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(GridwatchError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for (idx, monitor) in self.monitors.iter().enumerate() {
            if !is_valid_format(&monitor.zip) {
                return Err(GridwatchError::validation(
                    format!("monitors[{}].zip", idx),
                    "Invalid postal code format".to_string(),
                ));
            }
            if monitor.offsets.is_empty() {
                return Err(GridwatchError::validation(
                    format!("monitors[{}].offsets", idx),
                    "At least one offset must be tracked".to_string(),
                ));
            }
            if !seen.insert(monitor.zip.as_str()) {
                return Err(GridwatchError::validation(
                    format!("monitors[{}].zip", idx),
                    format!("Duplicate postal code {}", monitor.zip),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.stromgedacht.de/v1");
        assert_eq!(config.poll_interval_ms, 600_000);
        assert!(config.monitors.is_empty());
        assert!(config.api.user_agent.starts_with("gridwatch/"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.base_url = "https://api.stromgedacht.de/v1/".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.api.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.monitors.push(MonitorConfig::new("7017"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_offsets_default_when_omitted() {
        let yaml = "monitors:\n  - zip: \"70173\"\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.monitors[0].offsets, Offset::DEFAULT.to_vec());
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
