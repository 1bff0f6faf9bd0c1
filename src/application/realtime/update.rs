//! What the client hands to its owner: updates and status changes.

use async_trait::async_trait;

use super::mode::{ConnectionMode, ConnectionStatus};
use crate::domain::booking::{ChangeEnvelope, EventKey, VersionSnapshot};

/// A change observed by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    /// Full change event from the push stream.
    Change(ChangeEnvelope),
    /// A version counter moved; detail is not known.
    VersionChange(VersionSnapshot),
}

impl ClientUpdate {
    /// Unix seconds the update refers to.
    pub fn timestamp(&self) -> i64 {
        match self {
            ClientUpdate::Change(envelope) => envelope.timestamp,
            ClientUpdate::VersionChange(versions) => versions.timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientUpdate::Change(envelope) => envelope.kind.as_str(),
            ClientUpdate::VersionChange(_) => "version_change",
        }
    }

    /// Dedup identity. Version changes are keyed by the global counter.
    pub fn key(&self) -> EventKey {
        match self {
            ClientUpdate::Change(envelope) => envelope.key(),
            ClientUpdate::VersionChange(versions) => {
                EventKey::new(versions.timestamp, self.kind(), versions.version)
            }
        }
    }
}

/// Receives every update the client observes.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn on_update(&self, update: ClientUpdate);
}

/// Adapts a plain closure into an [`UpdateHandler`].
pub struct FnUpdateHandler<F>(pub F);

#[async_trait]
impl<F> UpdateHandler for FnUpdateHandler<F>
where
    F: Fn(ClientUpdate) + Send + Sync,
{
    async fn on_update(&self, update: ClientUpdate) {
        (self.0)(update)
    }
}

/// Receives indicator changes: status, a human-readable message, and the
/// mode the client is in.
pub trait StatusListener: Send + Sync {
    fn on_status(&self, status: ConnectionStatus, message: &str, mode: ConnectionMode);
}

impl<F> StatusListener for F
where
    F: Fn(ConnectionStatus, &str, ConnectionMode) + Send + Sync,
{
    fn on_status(&self, status: ConnectionStatus, message: &str, mode: ConnectionMode) {
        self(status, message, mode)
    }
}

/// Listener that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusListener;

impl StatusListener for LogStatusListener {
    fn on_status(&self, status: ConnectionStatus, message: &str, mode: ConnectionMode) {
        tracing::info!(%status, %mode, message, "Realtime status changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingSnapshot, ChangeKind};
    use crate::domain::foundation::{BookingId, Timestamp};

    #[test]
    fn change_key_uses_envelope_identity() {
        let envelope = ChangeEnvelope::new(
            ChangeKind::Update,
            Timestamp::from_unix_secs(1_700_000_000),
            BookingSnapshot::new(BookingId::new(9)),
        );
        let update = ClientUpdate::Change(envelope);

        assert_eq!(update.key().as_str(), "1700000000_update_9");
        assert_eq!(update.kind(), "update");
    }

    #[test]
    fn version_change_key_uses_global_counter() {
        let update = ClientUpdate::VersionChange(VersionSnapshot {
            version: 42,
            specialist_version: 3,
            work_location_version: 0,
            timestamp: 1_700_000_100,
        });

        assert_eq!(update.key().as_str(), "1700000100_version_change_42");
        assert_eq!(update.timestamp(), 1_700_000_100);
    }
}
