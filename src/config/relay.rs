//! Relay configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::events::{ChangeRelayConfig, DeliveryPolicy};

/// How the relay process lives.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Loop until shut down.
    #[default]
    Daemon,
    /// Drain one batch and exit (cron style).
    Batch,
}

/// Where changes come from.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Drain the trigger-fed queue table.
    #[default]
    Queue,
    /// Diff snapshots of the bookings table.
    Diff,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    #[default]
    BestEffort,
    AtLeastOnce,
}

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub mode: RelayMode,

    pub source: SourceKind,

    /// Queue poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Rows per batch
    pub batch_size: u32,

    /// How long processed rows are kept, in seconds
    pub retention_secs: u64,

    /// Snapshot diff tick in milliseconds
    pub diff_tick_ms: u64,

    pub delivery: DeliveryMode,

    /// Publish attempts before a row is dead-lettered (at-least-once only)
    pub max_attempts: u32,
}

impl RelayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn diff_tick(&self) -> Duration {
        Duration::from_millis(self.diff_tick_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        match self.delivery {
            DeliveryMode::BestEffort => DeliveryPolicy::BestEffort,
            DeliveryMode::AtLeastOnce => DeliveryPolicy::AtLeastOnce {
                max_attempts: self.max_attempts,
            },
        }
    }

    /// Relay loop settings for the configured source.
    pub fn relay_config(&self) -> ChangeRelayConfig {
        let interval = match self.source {
            SourceKind::Queue => self.poll_interval(),
            SourceKind::Diff => self.diff_tick(),
        };
        ChangeRelayConfig::default()
            .with_poll_interval(interval)
            .with_batch_size(self.batch_size)
            .with_policy(self.delivery_policy())
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroInterval("relay.poll_interval_ms"));
        }
        if self.diff_tick_ms == 0 {
            return Err(ValidationError::ZeroInterval("relay.diff_tick_ms"));
        }
        if self.delivery == DeliveryMode::AtLeastOnce && self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::Daemon,
            source: SourceKind::Queue,
            poll_interval_ms: 1_000,
            batch_size: 100,
            retention_secs: 3_600,
            diff_tick_ms: 2_000,
            delivery: DeliveryMode::BestEffort,
            max_attempts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.mode, RelayMode::Daemon);
        assert_eq!(config.source, SourceKind::Queue);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.retention(), Duration::from_secs(3600));
        assert_eq!(config.delivery_policy(), DeliveryPolicy::BestEffort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_at_least_once_policy_carries_attempts() {
        let config = RelayConfig {
            delivery: DeliveryMode::AtLeastOnce,
            max_attempts: 3,
            ..Default::default()
        };
        assert_eq!(
            config.delivery_policy(),
            DeliveryPolicy::AtLeastOnce { max_attempts: 3 }
        );
    }

    #[test]
    fn test_relay_config_uses_diff_tick_for_diff_source() {
        let config = RelayConfig {
            source: SourceKind::Diff,
            batch_size: 250,
            ..Default::default()
        };
        let relay = config.relay_config();
        assert_eq!(relay.poll_interval, Duration::from_secs(2));
        assert_eq!(relay.batch_size, 250);
    }

    #[test]
    fn test_validation_batch_size_bounds() {
        for batch_size in [0, 1001] {
            let config = RelayConfig {
                batch_size,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));
        }
    }

    #[test]
    fn test_validation_zero_attempts_for_at_least_once() {
        let config = RelayConfig {
            delivery: DeliveryMode::AtLeastOnce,
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxAttempts));
    }
}
