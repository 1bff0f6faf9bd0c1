//! KeyValueStore port - Small persistent string store for client state that
//! must survive a page reload (dedup cache, last reload time).

use async_trait::async_trait;

/// Errors that can occur during key-value operations
#[derive(Debug, thiserror::Error)]
pub enum KeyValueError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to serialize value: {0}")]
    Serialization(String),
}

/// Port for persisting client session values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError>;

    /// Store `value` under `key`, replacing what was there.
    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueError>;

    /// Delete `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), KeyValueError>;
}
