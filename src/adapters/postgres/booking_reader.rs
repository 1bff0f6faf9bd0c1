//! PostgreSQL implementation of BookingSnapshotReader.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Map;
use sqlx::PgPool;

use crate::domain::booking::BookingSnapshot;
use crate::domain::foundation::{BookingId, DomainError, SpecialistId, Timestamp, WorkLocationId};
use crate::ports::{BookingRecord, BookingSnapshotReader};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reads the `bookings` table for the diff monitor.
pub struct PostgresBookingReader {
    pool: PgPool,
}

impl PostgresBookingReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: i64,
    specialist_id: Option<i64>,
    work_location_id: Option<i64>,
    client_name: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for BookingRecord {
    fn from(row: BookingRow) -> Self {
        BookingRecord {
            snapshot: BookingSnapshot {
                booking_id: BookingId::new(row.id),
                specialist_id: row.specialist_id.map(SpecialistId::new),
                work_location_id: row.work_location_id.map(WorkLocationId::new),
                client_name: row.client_name,
                start_time: row.start_time.map(|t| t.format(DATETIME_FORMAT).to_string()),
                end_time: row.end_time.map(|t| t.format(DATETIME_FORMAT).to_string()),
                extra: Map::new(),
            },
            updated_at: Timestamp::from_datetime(row.updated_at),
        }
    }
}

#[async_trait]
impl BookingSnapshotReader for PostgresBookingReader {
    async fn current_bookings(&self) -> Result<Vec<BookingRecord>, DomainError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r#"
            SELECT id, specialist_id, work_location_id, client_name, start_time, end_time, updated_at
            FROM bookings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to read bookings: {}", e)))?;

        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }
}
