//! ChangeSource port - Where the relay gets its next batch of changes.
//!
//! Two strategies sit behind it: draining the event queue table, or diffing
//! periodic snapshots of the bookings table. The relay and everything
//! downstream of it are identical for both.

use async_trait::async_trait;

use crate::domain::booking::ChangeEnvelope;
use crate::domain::foundation::{DomainError, QueueEventId, Timestamp};

/// One change handed to the relay.
#[derive(Debug, Clone)]
pub struct SourcedChange {
    /// Queue row backing this change, if the source is durable.
    pub receipt: Option<QueueEventId>,

    /// Publish attempts already made for this change.
    pub attempts: u32,

    /// Decoded change, or why it could not be decoded.
    pub change: Result<ChangeEnvelope, DomainError>,
}

impl SourcedChange {
    /// A change with no durable backing (nothing to settle).
    pub fn ephemeral(change: ChangeEnvelope) -> Self {
        Self {
            receipt: None,
            attempts: 0,
            change: Ok(change),
        }
    }
}

/// Outcome the relay reports back for each change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Published (or publish outcome ignored under best-effort delivery).
    Delivered,
    /// Undecodable; never retried.
    Discarded { reason: String },
    /// Publish failed; hand it out again on a later poll.
    Retry { error: String },
    /// Publish failed too many times; stop retrying but keep the error.
    DeadLettered { error: String },
}

/// Port for change detection strategies.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Next batch of at most `limit` changes.
    async fn poll_batch(&self, limit: u32) -> Result<Vec<SourcedChange>, DomainError>;

    /// Record what happened to a change from the last batch.
    async fn settle(
        &self,
        _change: &SourcedChange,
        _settlement: Settlement,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    /// Periodic cleanup after each batch. Returns records removed.
    async fn housekeeping(&self, _now: Timestamp) -> Result<u64, DomainError> {
        Ok(0)
    }
}
