//! PostgreSQL implementation of EventQueue.
//!
//! Backs the queue with the `booking_event_queue` table (see `migrations/`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::booking::{BookingSnapshot, ChangeKind, QueueEvent};
use crate::domain::foundation::{DomainError, QueueEventId, Timestamp};
use crate::ports::EventQueue;

/// PostgreSQL implementation of the EventQueue port.
pub struct PostgresEventQueue {
    pool: PgPool,
}

impl PostgresEventQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a queue entry.
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: i64,
    event_type: String,
    payload: Value,
    processed: bool,
    created_at: DateTime<Utc>,
    attempts: i32,
    last_error: Option<String>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<QueueRow> for QueueEvent {
    fn from(row: QueueRow) -> Self {
        QueueEvent {
            id: QueueEventId::new(row.id),
            event_type: row.event_type,
            payload: row.payload,
            processed: row.processed,
            created_at: Timestamp::from_datetime(row.created_at),
            attempts: row.attempts.max(0) as u32,
            last_error: row.last_error,
            processed_at: row.processed_at.map(Timestamp::from_datetime),
        }
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl EventQueue for PostgresEventQueue {
    async fn enqueue(
        &self,
        kind: ChangeKind,
        snapshot: &BookingSnapshot,
    ) -> Result<QueueEvent, DomainError> {
        let payload = serde_json::to_value(snapshot)
            .map_err(|e| DomainError::malformed(format!("Failed to encode snapshot: {}", e)))?;

        let row: QueueRow = sqlx::query_as(
            r#"
            INSERT INTO booking_event_queue (event_type, payload)
            VALUES ($1, $2)
            RETURNING id, event_type, payload, processed, created_at, attempts, last_error, processed_at
            "#,
        )
        .bind(kind.as_str())
        .bind(&payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("enqueue booking change", e))?;

        Ok(row.into())
    }

    async fn fetch_unprocessed(&self, limit: u32) -> Result<Vec<QueueEvent>, DomainError> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            r#"
            SELECT id, event_type, payload, processed, created_at, attempts, last_error, processed_at
            FROM booking_event_queue
            WHERE processed = FALSE
            ORDER BY created_at ASC, id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch pending queue rows", e))?;

        Ok(rows.into_iter().map(QueueEvent::from).collect())
    }

    async fn mark_processed(
        &self,
        id: QueueEventId,
        note: Option<&str>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE booking_event_queue
            SET processed = TRUE,
                processed_at = NOW(),
                last_error = COALESCE($2, last_error)
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .bind(note)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("mark queue row processed", e))?;

        Ok(())
    }

    async fn record_failure(&self, id: QueueEventId, error: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE booking_event_queue
            SET attempts = attempts + 1,
                last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("record queue row failure", e))?;

        Ok(())
    }

    async fn purge_processed(&self, older_than: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM booking_event_queue
            WHERE processed = TRUE AND created_at < $1
            "#,
        )
        .bind(older_than.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("purge processed queue rows", e))?;

        Ok(result.rows_affected())
    }
}
