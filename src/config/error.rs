//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid server bind address")]
    InvalidBindAddress,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool size must be at least 1 with pool_min not above pool_max")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Batch size must be between 1 and 1000")]
    InvalidBatchSize,

    #[error("Interval '{0}' must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("At-least-once delivery needs max_attempts of at least 1")]
    InvalidMaxAttempts,

    #[error("Broadcast channel capacity must be greater than zero")]
    InvalidChannelCapacity,

    #[error("Client base URL must start with http:// or https://")]
    InvalidClientUrl,

    #[error("Polling minimum exceeds polling maximum")]
    InvalidPollingRange,
}
