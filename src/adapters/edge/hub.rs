//! In-process channel fanout for stream connections.
//!
//! Channels are keyed by [`ChannelAddress`], each backed by one broadcast
//! sender, so publishing costs one send per channel no matter how many
//! clients listen.
//!
//! ```text
//! specialist:3        work_location:8      admin:all
//! ├── client-a        ├── client-d         ├── client-f
//! └── client-b        └── client-e         └── client-g
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::domain::booking::{ChangeEnvelope, ChannelAddress};
use crate::domain::foundation::{ClientId, DomainError};
use crate::ports::ChangePublisher;

/// A serialized change envelope, shared between receivers.
pub type HubMessage = Arc<str>;

/// Manages stream connections grouped by channel.
///
/// Uses `RwLock` for the channel registry since broadcasts (reads) vastly
/// outnumber joins/leaves (writes).
pub struct ChannelHub {
    /// Map of channel → broadcast sender for that channel.
    channels: RwLock<HashMap<ChannelAddress, broadcast::Sender<HubMessage>>>,

    /// Map of client → channel for O(1) cleanup on disconnect.
    client_channels: RwLock<HashMap<ClientId, ChannelAddress>>,

    /// Buffer size of each channel's broadcast queue.
    channel_capacity: usize,
}

impl ChannelHub {
    /// Create a hub whose channels buffer `channel_capacity` messages.
    ///
    /// A client that falls further behind than this skips the oldest
    /// messages.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            client_channels: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Create with default capacity (128 messages).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Subscribe a client to a channel, creating the channel if needed.
    pub async fn join(
        &self,
        channel: ChannelAddress,
        client_id: ClientId,
    ) -> broadcast::Receiver<HubMessage> {
        let mut channels = self.channels.write().await;

        let sender = channels.entry(channel).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        self.client_channels
            .write()
            .await
            .insert(client_id, channel);

        sender.subscribe()
    }

    /// Remove a client, dropping its channel once nobody listens.
    pub async fn leave(&self, client_id: &ClientId) {
        // Same lock order as `join`.
        let mut channels = self.channels.write().await;
        let mut client_channels = self.client_channels.write().await;

        if let Some(channel) = client_channels.remove(client_id) {
            if !client_channels.values().any(|c| *c == channel) {
                channels.remove(&channel);
            }
        }
    }

    /// Send a raw message to every subscriber of a channel.
    ///
    /// Returns the number of receivers reached (0 when nobody listens).
    pub async fn broadcast(&self, channel: &ChannelAddress, message: HubMessage) -> usize {
        let channels = self.channels.read().await;

        channels
            .get(channel)
            .and_then(|sender| sender.send(message).ok())
            .unwrap_or(0)
    }

    /// Connected clients on one channel.
    pub async fn client_count(&self, channel: &ChannelAddress) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// All channels with at least one client (for monitoring/debugging).
    pub async fn active_channels(&self) -> Vec<ChannelAddress> {
        self.channels.read().await.keys().copied().collect()
    }

    /// Total connected clients across all channels.
    pub async fn total_client_count(&self) -> usize {
        self.client_channels.read().await.len()
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl ChangePublisher for ChannelHub {
    async fn publish(
        &self,
        channel: &ChannelAddress,
        envelope: &ChangeEnvelope,
    ) -> Result<(), DomainError> {
        let json = envelope
            .to_json()
            .map_err(|e| DomainError::malformed(format!("Failed to encode envelope: {}", e)))?;
        self.broadcast(channel, HubMessage::from(json)).await;
        Ok(())
    }
}
