//! Redis subscriber that feeds the local [`ChannelHub`].
//!
//! Pattern-subscribes to every booking channel and rebroadcasts each message
//! to the hub channel with the same address. Reconnects with exponential
//! backoff when the subscription drops.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;

use super::keys::channel_pattern;
use crate::adapters::edge::{ChannelHub, HubMessage};
use crate::domain::booking::ChannelAddress;
use crate::domain::foundation::DomainError;

const INITIAL_RETRY: Duration = Duration::from_secs(1);
const MAX_RETRY: Duration = Duration::from_secs(30);

/// Bridges Redis pub/sub into the in-process hub.
pub struct RedisRelay {
    client: redis::Client,
    hub: Arc<ChannelHub>,
}

impl RedisRelay {
    pub fn new(client: redis::Client, hub: Arc<ChannelHub>) -> Self {
        Self { client, hub }
    }

    /// Forward messages until shutdown, reconnecting on failure.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut retry = INITIAL_RETRY;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                result = self.forward() => {
                    match result {
                        Ok(forwarded) => {
                            tracing::warn!(forwarded, "Redis subscription ended, reconnecting");
                            if forwarded > 0 {
                                retry = INITIAL_RETRY;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, retry_ms = retry.as_millis() as u64, "Redis subscription failed"),
                    }

                    tokio::select! {
                        _ = tokio::time::sleep(retry) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                return;
                            }
                        }
                    }
                    retry = (retry * 2).min(MAX_RETRY);
                }
            }
        }
    }

    /// One subscription lifetime. Returns the number of forwarded messages
    /// when the stream ends.
    async fn forward(&self) -> Result<u64, DomainError> {
        let connection = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| DomainError::broker_unavailable(e.to_string()))?;
        let mut pubsub = connection.into_pubsub();
        pubsub
            .psubscribe(channel_pattern())
            .await
            .map_err(|e| DomainError::broker_unavailable(e.to_string()))?;

        tracing::info!(pattern = %channel_pattern(), "Subscribed to booking channels");

        let mut forwarded = 0_u64;
        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            let name = msg.get_channel_name().to_string();
            let channel = match ChannelAddress::from_channel_name(&name) {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::debug!(channel = %name, error = %e, "Ignoring message on unknown channel");
                    continue;
                }
            };
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(channel = %name, error = %e, "Dropping non-text payload");
                    continue;
                }
            };

            let reached = self.hub.broadcast(&channel, HubMessage::from(payload)).await;
            forwarded += 1;
            tracing::trace!(channel = %channel, reached, "Forwarded booking change");
        }

        Ok(forwarded)
    }
}
