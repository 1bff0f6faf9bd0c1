//! Edge service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Edge service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Seconds between heartbeat events on each stream
    pub heartbeat_secs: u64,

    /// Buffered messages per channel before slow clients start lagging
    pub channel_capacity: usize,
}

impl EdgeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Validate edge configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.heartbeat_secs == 0 {
            return Err(ValidationError::ZeroInterval("edge.heartbeat_secs"));
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            channel_capacity: 256,
        }
    }
}
