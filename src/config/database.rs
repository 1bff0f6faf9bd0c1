//! PostgreSQL settings for the commands that read the queue or the bookings
//! table.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on `pool_max`; the relay and the diff monitor run one query
/// at a time, so anything near this is a misconfiguration.
const POOL_CEILING: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,

    pub pool_min: u32,

    pub pool_max: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,

    /// Seconds before an unused connection is closed
    pub idle_timeout_secs: u64,

    /// Apply `migrations/` before the command starts
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_URL"));
        }
        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.pool_max > POOL_CEILING {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.pool_max == 0 || self.pool_min > self.pool_max {
            return Err(ValidationError::InvalidPoolSize);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_min: 1,
            pool_max: 5,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            run_migrations: false,
        }
    }
}
