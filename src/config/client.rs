//! Client (watcher) configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for the `watch` command's delivery client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Edge service base URL
    pub base_url: String,

    /// Version endpoint path, appended to `base_url`
    pub version_path: String,

    pub polling_min_ms: u64,

    pub polling_max_ms: u64,

    /// Use the push stream; false polls only
    pub streaming_enabled: bool,

    /// File that keeps dedup and refresh state across restarts
    pub state_file: PathBuf,

    /// Connect timeout for the push stream, in seconds
    pub connect_timeout_secs: u64,

    /// Log every update at info level
    pub debug: bool,
}

impl ClientConfig {
    pub fn version_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.version_path)
    }

    pub fn polling_min(&self) -> Duration {
        Duration::from_millis(self.polling_min_ms)
    }

    pub fn polling_max(&self) -> Duration {
        Duration::from_millis(self.polling_max_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate client configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidClientUrl);
        }
        if self.polling_min_ms == 0 {
            return Err(ValidationError::ZeroInterval("client.polling_min_ms"));
        }
        if self.polling_min_ms > self.polling_max_ms {
            return Err(ValidationError::InvalidPollingRange);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            version_path: "/versions".to_string(),
            polling_min_ms: 5_000,
            polling_max_ms: 30_000,
            streaming_enabled: true,
            state_file: PathBuf::from("./data/watcher-state.json"),
            connect_timeout_secs: 10,
            debug: false,
        }
    }
}
