//! In-memory event queue for testing and single-process demos.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::SystemClock;
use crate::domain::booking::{BookingSnapshot, ChangeKind, QueueEvent};
use crate::domain::foundation::{DomainError, QueueEventId, Timestamp};
use crate::ports::{Clock, EventQueue};

/// Event queue held in a vector, ordered by insertion.
///
/// `created_at` comes from the injected clock so retention tests can move
/// time forward.
pub struct InMemoryEventQueue {
    rows: RwLock<Vec<QueueEvent>>,
    next_id: RwLock<i64>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEventQueue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: RwLock::new(1),
            clock,
        }
    }

    /// Insert a raw row as the mutation path would, bypassing decoding.
    pub async fn push_raw(&self, event_type: &str, payload: serde_json::Value) -> QueueEventId {
        let id = self.allocate_id().await;
        let row = QueueEvent::pending(id, event_type, payload, self.clock.now());
        self.rows.write().await.push(row);
        id
    }

    // === Test Helpers ===

    /// Snapshot of every row, processed or not.
    pub async fn all(&self) -> Vec<QueueEvent> {
        self.rows.read().await.clone()
    }

    pub async fn get(&self, id: QueueEventId) -> Option<QueueEvent> {
        self.rows.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn pending_count(&self) -> usize {
        self.rows.read().await.iter().filter(|r| !r.processed).count()
    }

    async fn allocate_id(&self) -> QueueEventId {
        let mut next = self.next_id.write().await;
        let id = QueueEventId::new(*next);
        *next += 1;
        id
    }
}

impl Default for InMemoryEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventQueue for InMemoryEventQueue {
    async fn enqueue(
        &self,
        kind: ChangeKind,
        snapshot: &BookingSnapshot,
    ) -> Result<QueueEvent, DomainError> {
        let payload = serde_json::to_value(snapshot)
            .map_err(|e| DomainError::malformed(format!("Failed to encode snapshot: {}", e)))?;
        let id = self.allocate_id().await;
        let row = QueueEvent::pending(id, kind.as_str(), payload, self.clock.now());
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn fetch_unprocessed(&self, limit: u32) -> Result<Vec<QueueEvent>, DomainError> {
        let rows = self.rows.read().await;
        let mut pending: Vec<QueueEvent> = rows.iter().filter(|r| !r.processed).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps.
        pending.sort_by_key(|r| r.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_processed(
        &self,
        id: QueueEventId,
        note: Option<&str>,
    ) -> Result<(), DomainError> {
        let now = self.clock.now();
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.processed = true;
            row.processed_at = Some(now);
            if let Some(note) = note {
                row.last_error = Some(note.to_string());
            }
        }
        Ok(())
    }

    async fn record_failure(&self, id: QueueEventId, error: &str) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.attempts += 1;
            row.last_error = Some(error.to_string());
        }
        Ok(())
    }

    async fn purge_processed(&self, older_than: Timestamp) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !r.is_purgeable(&older_than));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualClock;
    use crate::domain::foundation::BookingId;
    use std::time::Duration;

    fn snapshot(id: i64) -> BookingSnapshot {
        BookingSnapshot::new(BookingId::new(id))
    }

    #[tokio::test]
    async fn fetch_returns_oldest_first_up_to_limit() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_000)));
        let queue = InMemoryEventQueue::with_clock(clock.clone());

        let first = queue.enqueue(ChangeKind::Create, &snapshot(1)).await.unwrap();
        clock.advance(Duration::from_secs(1));
        let second = queue.enqueue(ChangeKind::Update, &snapshot(1)).await.unwrap();
        clock.advance(Duration::from_secs(1));
        queue.enqueue(ChangeKind::Delete, &snapshot(2)).await.unwrap();

        let batch = queue.fetch_unprocessed(2).await.unwrap();
        assert_eq!(batch.iter().map(|r| r.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn processed_rows_are_not_fetched_again() {
        let queue = InMemoryEventQueue::new();
        let row = queue.enqueue(ChangeKind::Create, &snapshot(1)).await.unwrap();

        queue.mark_processed(row.id, None).await.unwrap();

        assert!(queue.fetch_unprocessed(10).await.unwrap().is_empty());
        assert!(queue.get(row.id).await.unwrap().processed_at.is_some());
    }

    #[tokio::test]
    async fn record_failure_keeps_row_pending() {
        let queue = InMemoryEventQueue::new();
        let row = queue.enqueue(ChangeKind::Create, &snapshot(1)).await.unwrap();

        queue.record_failure(row.id, "broker down").await.unwrap();

        let stored = queue.get(row.id).await.unwrap();
        assert!(!stored.processed);
        assert_eq!(stored.attempts, 1);
        assert_eq!(stored.last_error.as_deref(), Some("broker down"));
    }

    #[tokio::test]
    async fn purge_removes_only_old_processed_rows() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(0)));
        let queue = InMemoryEventQueue::with_clock(clock.clone());
        let done = queue.enqueue(ChangeKind::Create, &snapshot(1)).await.unwrap();
        queue.enqueue(ChangeKind::Update, &snapshot(1)).await.unwrap();
        queue.mark_processed(done.id, None).await.unwrap();

        let removed = queue
            .purge_processed(Timestamp::from_unix_secs(10))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(queue.len().await, 1);
        assert_eq!(queue.pending_count().await, 1);
    }

    #[tokio::test]
    async fn marking_unknown_row_is_not_an_error() {
        let queue = InMemoryEventQueue::new();
        assert!(queue.mark_processed(QueueEventId::new(99), None).await.is_ok());
    }
}
