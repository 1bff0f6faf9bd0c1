//! In-memory broker implementation for testing.
//!
//! Records every publish for assertions and can simulate an outage, either
//! for the whole broker or for single channels.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::booking::{ChangeEnvelope, ChannelAddress};
use crate::domain::foundation::DomainError;
use crate::ports::ChangePublisher;

/// In-memory broker for testing.
///
/// # Example
///
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new());
/// relay.run_once().await?;
/// assert_eq!(broker.publish_count(), 3);
/// assert_eq!(broker.published_on(&ChannelAddress::Admin).len(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryBroker {
    published: RwLock<Vec<(ChannelAddress, ChangeEnvelope)>>,
    unavailable: RwLock<bool>,
    failing_channels: RwLock<HashSet<ChannelAddress>>,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap_or_else(|e| e.into_inner()) = unavailable;
    }

    /// Make publishes to one channel fail.
    pub fn fail_channel(&self, channel: ChannelAddress) {
        self.failing_channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(channel);
    }

    // === Test Helpers ===

    /// Returns all successful publishes in order.
    pub fn published(&self) -> Vec<(ChannelAddress, ChangeEnvelope)> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Envelopes published on one channel.
    pub fn published_on(&self, channel: &ChannelAddress) -> Vec<ChangeEnvelope> {
        self.published()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, e)| e)
            .collect()
    }

    /// Returns count of successful publishes.
    pub fn publish_count(&self) -> usize {
        self.published.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Clears recorded publishes (for test isolation).
    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl ChangePublisher for InMemoryBroker {
    async fn publish(
        &self,
        channel: &ChannelAddress,
        envelope: &ChangeEnvelope,
    ) -> Result<(), DomainError> {
        if *self.unavailable.read().unwrap_or_else(|e| e.into_inner()) {
            return Err(DomainError::broker_unavailable("broker is unavailable")
                .with_detail("channel", channel.channel_name()));
        }

        if self
            .failing_channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(channel)
        {
            return Err(DomainError::broker_unavailable("channel rejected publish")
                .with_detail("channel", channel.channel_name()));
        }

        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((*channel, envelope.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingSnapshot, ChangeKind};
    use crate::domain::foundation::{BookingId, ErrorCode, SpecialistId, Timestamp};

    fn envelope() -> ChangeEnvelope {
        ChangeEnvelope::new(
            ChangeKind::Create,
            Timestamp::from_unix_secs(10),
            BookingSnapshot::new(BookingId::new(1)),
        )
    }

    #[tokio::test]
    async fn publish_records_channel_and_envelope() {
        let broker = InMemoryBroker::new();

        broker.publish(&ChannelAddress::Admin, &envelope()).await.unwrap();

        assert_eq!(broker.publish_count(), 1);
        assert_eq!(broker.published_on(&ChannelAddress::Admin), vec![envelope()]);
    }

    #[tokio::test]
    async fn unavailable_broker_rejects_with_broker_code() {
        let broker = InMemoryBroker::new();
        broker.set_unavailable(true);

        let err = broker
            .publish(&ChannelAddress::Admin, &envelope())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BrokerUnavailable);
        assert_eq!(broker.publish_count(), 0);

        broker.set_unavailable(false);
        assert!(broker.publish(&ChannelAddress::Admin, &envelope()).await.is_ok());
    }

    #[tokio::test]
    async fn failing_channel_does_not_affect_others() {
        let broker = InMemoryBroker::new();
        let specialist = ChannelAddress::Specialist(SpecialistId::new(2));
        broker.fail_channel(specialist);

        assert!(broker.publish(&specialist, &envelope()).await.is_err());
        assert!(broker.publish(&ChannelAddress::Admin, &envelope()).await.is_ok());
    }

    #[tokio::test]
    async fn clear_removes_all_records() {
        let broker = InMemoryBroker::new();
        broker.publish(&ChannelAddress::Admin, &envelope()).await.unwrap();
        broker.clear();
        assert_eq!(broker.publish_count(), 0);
    }
}
