//! Redis-backed version counters (`INCR` per scope).

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::keys::{global_version_key, specialist_version_key, work_location_version_key};
use crate::domain::booking::{BookingSnapshot, VersionQuery, VersionSnapshot};
use crate::domain::foundation::DomainError;
use crate::ports::VersionStore;

/// Version counters shared by every relay and edge instance.
#[derive(Clone)]
pub struct RedisVersionStore {
    conn: MultiplexedConnection,
}

impl RedisVersionStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    async fn read(&self, key: Option<String>) -> Result<u64, DomainError> {
        let Some(key) = key else {
            return Ok(0);
        };
        let mut conn = self.conn.clone();
        let value: Option<u64> = conn
            .get(&key)
            .await
            .map_err(|e: redis::RedisError| DomainError::cache(e.to_string()))?;
        Ok(value.unwrap_or(0))
    }
}

#[async_trait]
impl VersionStore for RedisVersionStore {
    async fn bump(&self, snapshot: &BookingSnapshot) -> Result<(), DomainError> {
        let mut pipe = redis::pipe();
        pipe.atomic().incr(global_version_key(), 1_i64).ignore();
        if let Some(id) = snapshot.specialist_id {
            pipe.incr(specialist_version_key(id), 1_i64).ignore();
        }
        if let Some(id) = snapshot.work_location_id {
            pipe.incr(work_location_version_key(id), 1_i64).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to bump versions: {}", e)))
    }

    async fn current(&self, query: &VersionQuery) -> Result<VersionSnapshot, DomainError> {
        Ok(VersionSnapshot {
            version: self.read(Some(global_version_key())).await?,
            specialist_version: self
                .read(query.specialist_scope().map(specialist_version_key))
                .await?,
            work_location_version: self
                .read(query.work_location_scope().map(work_location_version_key))
                .await?,
            timestamp: 0,
        })
    }
}

impl std::fmt::Debug for RedisVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisVersionStore").finish_non_exhaustive()
    }
}
