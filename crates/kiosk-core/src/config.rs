//! Kiosk configuration.
//!
//! Configuration is layered with the `config` crate: built-in defaults, an
//! optional TOML file, then environment variables prefixed with `KIOSK__`
//! (for example `KIOSK__SERVICE__BASE_URL`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DEVICE_ID, DEFAULT_FEED_LIMIT, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SCAN_GAP_MS, DEFAULT_SERVICE_URL,
};
use crate::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KioskConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub kiosk: StationConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote attendance service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://localhost:5000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Settings of this kiosk station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Device identifier sent with every check-in.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Number of history entries shown after a scan.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            history_limit: default_history_limit(),
        }
    }
}

/// Keystroke decoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Pause (ms) after which buffered characters are treated as abandoned.
    #[serde(default = "default_gap_ms")]
    pub gap_threshold_ms: u64,
}

impl ScannerConfig {
    pub fn gap_threshold(&self) -> Duration {
        Duration::from_millis(self.gap_threshold_ms)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: default_gap_ms(),
        }
    }
}

/// Administrative live feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Number of recent visits requested per poll.
    #[serde(default = "default_feed_limit")]
    pub limit: u32,
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            limit: default_feed_limit(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format: `"json"` or `"pretty"`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_device_id() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_gap_ms() -> u64 {
    DEFAULT_SCAN_GAP_MS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_feed_limit() -> u32 {
    DEFAULT_FEED_LIMIT
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl KioskConfig {
    /// Load configuration from an optional TOML file and `KIOSK__*` variables.
    ///
    /// A missing file is not an error; every key has a default.
    ///
    /// # Errors
    /// Returns `Error::Config` if a source cannot be parsed or the merged
    /// configuration fails [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let config: KioskConfig = builder
            .add_source(
                config::Environment::with_prefix("KIOSK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let url = self.service.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "service.base_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.kiosk.device_id.trim().is_empty() {
            return Err(Error::Config("kiosk.device_id must not be empty".to_string()));
        }
        if self.scanner.gap_threshold_ms == 0 {
            return Err(Error::Config(
                "scanner.gap_threshold_ms must be greater than zero".to_string(),
            ));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(Error::Config(
                "feed.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
