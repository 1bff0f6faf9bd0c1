//! EventQueue port - Durable ingestion point for booking changes.
//!
//! Every mutation path appends a row here; the relay drains it in
//! `created_at` order. Rows are never deleted on publish, only flagged
//! processed and purged once they outlive the retention window.

use async_trait::async_trait;

use crate::domain::booking::{BookingSnapshot, ChangeKind, QueueEvent};
use crate::domain::foundation::{DomainError, QueueEventId, Timestamp};

/// Port for the booking event queue table.
///
/// Implementations must ensure:
/// - `fetch_unprocessed` returns oldest rows first
/// - Marking a missing row is not an error (it may have been purged)
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Append a change notification.
    async fn enqueue(
        &self,
        kind: ChangeKind,
        snapshot: &BookingSnapshot,
    ) -> Result<QueueEvent, DomainError>;

    /// Up to `limit` unprocessed rows ordered by `created_at` ascending.
    async fn fetch_unprocessed(&self, limit: u32) -> Result<Vec<QueueEvent>, DomainError>;

    /// Flag a row processed. `note` is kept as `last_error` for rows that were
    /// discarded or dead-lettered rather than delivered.
    async fn mark_processed(
        &self,
        id: QueueEventId,
        note: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Record a failed publish attempt, leaving the row unprocessed.
    async fn record_failure(&self, id: QueueEventId, error: &str) -> Result<(), DomainError>;

    /// Delete processed rows created before `older_than`. Returns rows removed.
    async fn purge_processed(&self, older_than: Timestamp) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventQueue) {}
}
