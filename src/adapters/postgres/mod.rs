//! PostgreSQL adapters - Database implementations for the relay ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresEventQueue` - The `booking_event_queue` table
//! - `PostgresBookingReader` - Current bookings for snapshot diffing
//!
//! Schema lives in `migrations/` and is applied with [`run_migrations`].

mod booking_reader;
mod event_queue;

pub use booking_reader::PostgresBookingReader;
pub use event_queue::PostgresEventQueue;

use sqlx::PgPool;

use crate::domain::foundation::DomainError;

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}
