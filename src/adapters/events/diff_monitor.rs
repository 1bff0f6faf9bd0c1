//! DiffMonitor - Detects changes by diffing periodic booking snapshots.
//!
//! Used where a mutation path cannot be relied on to write the queue. Each
//! scan compares current bookings against the last known state:
//!
//! | Observation                          | Emitted  |
//! |--------------------------------------|----------|
//! | id not seen before                   | `create` |
//! | id seen with a different `updated_at`| `update` |
//! | id seen before, now missing          | `delete` |
//!
//! The first scan only primes the known state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::booking::{BookingSnapshot, ChangeEnvelope, ChangeKind};
use crate::domain::foundation::{BookingId, DomainError, Timestamp};
use crate::ports::{BookingRecord, BookingSnapshotReader, ChangeSource, Clock, SourcedChange};

#[derive(Default)]
struct MonitorState {
    /// `None` until the first scan.
    known: Option<HashMap<BookingId, BookingRecord>>,
    /// Changes detected but not yet handed out (a scan may exceed `limit`).
    backlog: VecDeque<ChangeEnvelope>,
}

/// Change source that diffs booking snapshots.
pub struct DiffMonitor {
    reader: Arc<dyn BookingSnapshotReader>,
    clock: Arc<dyn Clock>,
    state: Mutex<MonitorState>,
}

impl DiffMonitor {
    pub fn new(reader: Arc<dyn BookingSnapshotReader>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reader,
            clock,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Number of bookings currently tracked.
    pub async fn known_count(&self) -> usize {
        self.state
            .lock()
            .await
            .known
            .as_ref()
            .map(HashMap::len)
            .unwrap_or(0)
    }

    async fn scan(&self, state: &mut MonitorState) -> Result<(), DomainError> {
        let records = self.reader.current_bookings().await?;
        let now = self.clock.now();

        let Some(known) = state.known.as_mut() else {
            let primed: HashMap<BookingId, BookingRecord> = records
                .into_iter()
                .map(|r| (r.snapshot.booking_id, r))
                .collect();
            tracing::debug!(tracked = primed.len(), "Diff monitor primed");
            state.known = Some(primed);
            return Ok(());
        };

        let mut current = HashMap::with_capacity(records.len());
        for record in records {
            let id = record.snapshot.booking_id;
            match known.get(&id) {
                None => state
                    .backlog
                    .push_back(envelope(ChangeKind::Create, now, &record.snapshot)),
                Some(previous) if previous.updated_at != record.updated_at => state
                    .backlog
                    .push_back(envelope(ChangeKind::Update, now, &record.snapshot)),
                Some(_) => {}
            }
            current.insert(id, record);
        }

        let mut removed: Vec<&BookingRecord> = known
            .iter()
            .filter(|(id, _)| !current.contains_key(id))
            .map(|(_, record)| record)
            .collect();
        removed.sort_by_key(|r| r.snapshot.booking_id);
        for record in removed {
            state
                .backlog
                .push_back(envelope(ChangeKind::Delete, now, &record.snapshot));
        }

        *known = current;
        Ok(())
    }
}

fn envelope(kind: ChangeKind, at: Timestamp, snapshot: &BookingSnapshot) -> ChangeEnvelope {
    ChangeEnvelope::new(kind, at, snapshot.clone())
}

#[async_trait]
impl ChangeSource for DiffMonitor {
    fn name(&self) -> &'static str {
        "diff"
    }

    async fn poll_batch(&self, limit: u32) -> Result<Vec<SourcedChange>, DomainError> {
        let mut state = self.state.lock().await;

        if state.backlog.is_empty() {
            self.scan(&mut state).await?;
        }

        let take = (limit as usize).min(state.backlog.len());
        Ok(state
            .backlog
            .drain(..take)
            .map(SourcedChange::ephemeral)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualClock;
    use crate::domain::foundation::SpecialistId;

    #[derive(Default)]
    struct FakeReader {
        records: Mutex<Vec<BookingRecord>>,
    }

    impl FakeReader {
        async fn set(&self, records: Vec<BookingRecord>) {
            *self.records.lock().await = records;
        }
    }

    #[async_trait]
    impl BookingSnapshotReader for FakeReader {
        async fn current_bookings(&self) -> Result<Vec<BookingRecord>, DomainError> {
            Ok(self.records.lock().await.clone())
        }
    }

    fn record(id: i64, updated: i64) -> BookingRecord {
        BookingRecord {
            snapshot: BookingSnapshot::new(BookingId::new(id)).with_specialist(SpecialistId::new(1)),
            updated_at: Timestamp::from_unix_secs(updated),
        }
    }

    fn kinds(batch: &[SourcedChange]) -> Vec<(ChangeKind, i64)> {
        batch
            .iter()
            .map(|c| {
                let e = c.change.as_ref().unwrap();
                (e.kind, e.data.booking_id.value())
            })
            .collect()
    }

    fn monitor(reader: Arc<FakeReader>) -> DiffMonitor {
        DiffMonitor::new(
            reader,
            Arc::new(ManualClock::new(Timestamp::from_unix_secs(5_000))),
        )
    }

    #[tokio::test]
    async fn first_scan_primes_without_emitting() {
        let reader = Arc::new(FakeReader::default());
        reader.set(vec![record(1, 10), record(2, 10)]).await;
        let monitor = monitor(reader);

        assert!(monitor.poll_batch(100).await.unwrap().is_empty());
        assert_eq!(monitor.known_count().await, 2);
    }

    #[tokio::test]
    async fn detects_create_update_and_delete() {
        let reader = Arc::new(FakeReader::default());
        reader.set(vec![record(1, 10), record(2, 10)]).await;
        let monitor = monitor(reader.clone());
        monitor.poll_batch(100).await.unwrap();

        reader.set(vec![record(1, 11), record(3, 10)]).await;
        let batch = monitor.poll_batch(100).await.unwrap();

        assert_eq!(
            kinds(&batch),
            vec![
                (ChangeKind::Update, 1),
                (ChangeKind::Create, 3),
                (ChangeKind::Delete, 2),
            ]
        );
        assert!(batch.iter().all(|c| c.receipt.is_none()));
        assert_eq!(batch[0].change.as_ref().unwrap().timestamp, 5_000);
    }

    #[tokio::test]
    async fn unchanged_records_emit_nothing() {
        let reader = Arc::new(FakeReader::default());
        reader.set(vec![record(1, 10)]).await;
        let monitor = monitor(reader);
        monitor.poll_batch(100).await.unwrap();

        assert!(monitor.poll_batch(100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backlog_is_handed_out_in_limited_batches() {
        let reader = Arc::new(FakeReader::default());
        let monitor = monitor(reader.clone());
        monitor.poll_batch(100).await.unwrap();

        reader.set((1..=5).map(|id| record(id, 1)).collect()).await;

        assert_eq!(monitor.poll_batch(2).await.unwrap().len(), 2);
        assert_eq!(monitor.poll_batch(2).await.unwrap().len(), 2);
        assert_eq!(monitor.poll_batch(2).await.unwrap().len(), 1);
        assert!(monitor.poll_batch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_booking_keeps_its_last_snapshot_for_routing() {
        let reader = Arc::new(FakeReader::default());
        reader.set(vec![record(7, 1)]).await;
        let monitor = monitor(reader.clone());
        monitor.poll_batch(100).await.unwrap();

        reader.set(vec![]).await;
        let batch = monitor.poll_batch(100).await.unwrap();

        let deleted = batch[0].change.as_ref().unwrap();
        assert_eq!(deleted.kind, ChangeKind::Delete);
        assert_eq!(deleted.data.specialist_id, Some(SpecialistId::new(1)));
    }
}
