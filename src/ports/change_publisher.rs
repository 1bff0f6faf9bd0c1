//! ChangePublisher port - Interface for publishing booking changes.
//!
//! This port defines how the relay hands a change to the broker without
//! knowing about the transport (Redis, in-process hub, etc.).

use async_trait::async_trait;

use crate::domain::booking::{ChangeEnvelope, ChannelAddress};
use crate::domain::foundation::DomainError;

/// Port for publishing a change on one channel.
///
/// Implementations report broker failures with
/// `ErrorCode::BrokerUnavailable`. Publishing to a channel nobody listens on
/// is not an error.
///
/// # Example
///
/// ```ignore
/// for channel in ChannelAddress::fan_out(&envelope.data) {
///     publisher.publish(&channel, &envelope).await?;
/// }
/// ```
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(
        &self,
        channel: &ChannelAddress,
        envelope: &ChangeEnvelope,
    ) -> Result<(), DomainError>;
}
