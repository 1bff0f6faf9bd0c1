//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BOOKING_REALTIME` prefix and nested values use double underscores as separators.
//!
//! Every section has defaults. The database and Redis URLs are only required
//! by the commands that use them; see [`AppConfig::require_database`] and
//! [`AppConfig::require_redis`].
//!
//! # Example
//!
//! ```no_run
//! use booking_realtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Edge listening on {:?}", config.server.socket_addr());
//! ```

mod client;
mod database;
mod edge;
mod error;
mod redis;
mod relay;
mod server;

pub use client::ClientConfig;
pub use database::DatabaseConfig;
pub use edge::EdgeConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use relay::{DeliveryMode, RelayConfig, RelayMode, SourceKind};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration (pub/sub and version counters)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Relay worker configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Edge service configuration
    #[serde(default)]
    pub edge: EdgeConfig,

    /// Delivery client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BOOKING_REALTIME` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BOOKING_REALTIME__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BOOKING_REALTIME__RELAY__DELIVERY=at_least_once` -> `relay.delivery`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BOOKING_REALTIME")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate the sections every command uses
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.relay.validate()?;
        self.edge.validate()?;
        self.client.validate()?;
        Ok(())
    }

    /// Database settings, validated; for commands that read PostgreSQL.
    pub fn require_database(&self) -> Result<&DatabaseConfig, ValidationError> {
        self.database.validate()?;
        Ok(&self.database)
    }

    /// Redis settings, validated; for commands that publish or subscribe.
    pub fn require_redis(&self) -> Result<&RedisConfig, ValidationError> {
        self.redis.validate()?;
        Ok(&self.redis)
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
