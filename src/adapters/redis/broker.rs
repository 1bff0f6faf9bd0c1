//! Redis pub/sub publisher.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::booking::{ChangeEnvelope, ChannelAddress};
use crate::domain::foundation::DomainError;
use crate::ports::ChangePublisher;

/// Publishes changes with `PUBLISH bookings:{scope}:{id}`.
#[derive(Clone)]
pub struct RedisBroker {
    conn: MultiplexedConnection,
}

impl RedisBroker {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ChangePublisher for RedisBroker {
    async fn publish(
        &self,
        channel: &ChannelAddress,
        envelope: &ChangeEnvelope,
    ) -> Result<(), DomainError> {
        let payload = envelope
            .to_json()
            .map_err(|e| DomainError::malformed(format!("Failed to encode envelope: {}", e)))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(channel.channel_name(), payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::broker_unavailable(e.to_string())
                    .with_detail("channel", channel.channel_name())
            })?;

        tracing::trace!(channel = %channel, receivers, "Published to Redis");
        Ok(())
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker").finish_non_exhaustive()
    }
}
