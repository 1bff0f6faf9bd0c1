//! BookingSnapshotReader port - Read side used by the diff monitor.

use async_trait::async_trait;

use crate::domain::booking::BookingSnapshot;
use crate::domain::foundation::{DomainError, Timestamp};

/// A booking as currently stored, with its last modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub snapshot: BookingSnapshot,
    pub updated_at: Timestamp,
}

/// Port for listing the current bookings.
#[async_trait]
pub trait BookingSnapshotReader: Send + Sync {
    async fn current_bookings(&self) -> Result<Vec<BookingRecord>, DomainError>;
}
