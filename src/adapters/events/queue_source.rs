//! QueueChangeSource - Drains the durable event queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{ChangeSource, EventQueue, Settlement, SourcedChange};

/// Processed rows are kept this long before purging.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Change source backed by the event queue table.
///
/// Every change it hands out carries the queue row id as its receipt; the
/// settlement decides whether that row is flagged processed or left for a
/// later poll.
pub struct QueueChangeSource {
    queue: Arc<dyn EventQueue>,
    retention: Duration,
}

impl QueueChangeSource {
    pub fn new(queue: Arc<dyn EventQueue>) -> Self {
        Self::with_retention(queue, DEFAULT_RETENTION)
    }

    pub fn with_retention(queue: Arc<dyn EventQueue>, retention: Duration) -> Self {
        Self { queue, retention }
    }
}

#[async_trait]
impl ChangeSource for QueueChangeSource {
    fn name(&self) -> &'static str {
        "queue"
    }

    async fn poll_batch(&self, limit: u32) -> Result<Vec<SourcedChange>, DomainError> {
        let rows = self.queue.fetch_unprocessed(limit).await?;

        Ok(rows
            .into_iter()
            .map(|row| SourcedChange {
                receipt: Some(row.id),
                attempts: row.attempts,
                change: row.decode(),
            })
            .collect())
    }

    async fn settle(
        &self,
        change: &SourcedChange,
        settlement: Settlement,
    ) -> Result<(), DomainError> {
        let Some(id) = change.receipt else {
            return Ok(());
        };

        match settlement {
            Settlement::Delivered => self.queue.mark_processed(id, None).await,
            Settlement::Discarded { reason } => {
                self.queue
                    .mark_processed(id, Some(&format!("discarded: {}", reason)))
                    .await
            }
            Settlement::Retry { error } => self.queue.record_failure(id, &error).await,
            Settlement::DeadLettered { error } => {
                self.queue.record_failure(id, &error).await?;
                self.queue
                    .mark_processed(id, Some(&format!("dead-lettered: {}", error)))
                    .await
            }
        }
    }

    async fn housekeeping(&self, now: Timestamp) -> Result<u64, DomainError> {
        self.queue.purge_processed(now.minus(self.retention)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventQueue, ManualClock};
    use crate::domain::booking::{BookingSnapshot, ChangeKind};
    use crate::domain::foundation::{BookingId, ErrorCode};
    use serde_json::json;

    fn snapshot(id: i64) -> BookingSnapshot {
        BookingSnapshot::new(BookingId::new(id))
    }

    #[tokio::test]
    async fn poll_batch_decodes_rows_and_carries_receipts() {
        let queue = Arc::new(InMemoryEventQueue::new());
        let row = queue.enqueue(ChangeKind::Create, &snapshot(4)).await.unwrap();
        let source = QueueChangeSource::new(queue.clone());

        let batch = source.poll_batch(10).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].receipt, Some(row.id));
        assert_eq!(batch[0].change.as_ref().unwrap().data.booking_id, BookingId::new(4));
    }

    #[tokio::test]
    async fn malformed_rows_surface_as_errors_not_batch_failures() {
        let queue = Arc::new(InMemoryEventQueue::new());
        queue.push_raw("update", json!({"no_id": true})).await;
        queue.enqueue(ChangeKind::Delete, &snapshot(1)).await.unwrap();
        let source = QueueChangeSource::new(queue);

        let batch = source.poll_batch(10).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch[0].change.as_ref().unwrap_err().code,
            ErrorCode::MalformedPayload
        );
        assert!(batch[1].change.is_ok());
    }

    #[tokio::test]
    async fn settlements_map_to_queue_updates() {
        let queue = Arc::new(InMemoryEventQueue::new());
        for id in 1..=4 {
            queue.enqueue(ChangeKind::Update, &snapshot(id)).await.unwrap();
        }
        let source = QueueChangeSource::new(queue.clone());
        let batch = source.poll_batch(10).await.unwrap();

        source.settle(&batch[0], Settlement::Delivered).await.unwrap();
        source
            .settle(&batch[1], Settlement::Discarded { reason: "bad".into() })
            .await
            .unwrap();
        source
            .settle(&batch[2], Settlement::Retry { error: "down".into() })
            .await
            .unwrap();
        source
            .settle(&batch[3], Settlement::DeadLettered { error: "down".into() })
            .await
            .unwrap();

        let rows = queue.all().await;
        assert!(rows[0].processed && rows[0].last_error.is_none());
        assert!(rows[1].processed);
        assert_eq!(rows[1].last_error.as_deref(), Some("discarded: bad"));
        assert!(!rows[2].processed);
        assert_eq!(rows[2].attempts, 1);
        assert!(rows[3].processed);
        assert_eq!(rows[3].last_error.as_deref(), Some("dead-lettered: down"));
    }

    #[tokio::test]
    async fn housekeeping_purges_after_retention() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(0)));
        let queue = Arc::new(InMemoryEventQueue::with_clock(clock.clone()));
        let row = queue.enqueue(ChangeKind::Create, &snapshot(1)).await.unwrap();
        queue.mark_processed(row.id, None).await.unwrap();
        let source = QueueChangeSource::new(queue.clone());

        assert_eq!(source.housekeeping(Timestamp::from_unix_secs(59 * 60)).await.unwrap(), 0);
        assert_eq!(source.housekeeping(Timestamp::from_unix_secs(61 * 60)).await.unwrap(), 1);
        assert!(queue.is_empty().await);
    }
}
