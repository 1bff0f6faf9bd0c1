//! Rows of the durable event queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BookingSnapshot, ChangeEnvelope, ChangeKind};
use crate::domain::foundation::{DomainError, QueueEventId, Timestamp, ValidationError};

/// A pending (or recently drained) change notification.
///
/// `processed` only means the relay has handled the row; it is not a delivery
/// receipt. Processed rows are purged after the retention window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub id: QueueEventId,

    /// Raw type as written by the mutation path.
    pub event_type: String,

    /// Raw payload; decoded lazily so one bad row cannot poison a batch.
    pub payload: Value,

    pub processed: bool,

    pub created_at: Timestamp,

    /// Failed publish attempts so far.
    pub attempts: u32,

    pub last_error: Option<String>,

    pub processed_at: Option<Timestamp>,
}

impl QueueEvent {
    /// Creates an unprocessed row.
    pub fn pending(
        id: QueueEventId,
        event_type: impl Into<String>,
        payload: Value,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            payload,
            processed: false,
            created_at,
            attempts: 0,
            last_error: None,
            processed_at: None,
        }
    }

    /// Decodes the row into a change envelope stamped with `created_at`.
    ///
    /// The relay restamps it with the publish time before it goes out.
    pub fn decode(&self) -> Result<ChangeEnvelope, DomainError> {
        let kind: ChangeKind = self.event_type.parse().map_err(|e: ValidationError| {
            DomainError::malformed(e.to_string()).with_detail("queue_event_id", self.id.to_string())
        })?;

        let data: BookingSnapshot = serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::malformed(format!("undecodable payload: {}", e))
                .with_detail("queue_event_id", self.id.to_string())
                .with_detail("event_type", self.event_type.clone())
        })?;

        Ok(ChangeEnvelope::new(kind, self.created_at, data))
    }

    /// Whether a processed row has outlived the retention cutoff.
    pub fn is_purgeable(&self, cutoff: &Timestamp) -> bool {
        self.processed && self.created_at.is_before(cutoff)
    }
}
