//! Booking change notifications as they travel from the queue to clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{BookingId, SpecialistId, Timestamp, ValidationError, WorkLocationId};

/// The kind of mutation that happened to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    /// Returns the wire name (`create`, `update`, `delete`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(ChangeKind::Create),
            "update" => Ok(ChangeKind::Update),
            "delete" => Ok(ChangeKind::Delete),
            other => Err(ValidationError::invalid_format(
                "event_type",
                format!("unknown change kind '{}'", other),
            )),
        }
    }
}

/// The booking fields carried with every change.
///
/// Only `booking_id` is required. Fields the mutation path adds beyond the
/// known set are kept in `extra` and forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub booking_id: BookingId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist_id: Option<SpecialistId>,

    #[serde(
        default,
        alias = "working_point_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub work_location_id: Option<WorkLocationId>,

    #[serde(
        default,
        alias = "client_full_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_name: Option<String>,

    #[serde(
        default,
        alias = "booking_start_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,

    #[serde(
        default,
        alias = "booking_end_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookingSnapshot {
    /// Creates a snapshot carrying only the booking id.
    pub fn new(booking_id: BookingId) -> Self {
        Self {
            booking_id,
            specialist_id: None,
            work_location_id: None,
            client_name: None,
            start_time: None,
            end_time: None,
            extra: Map::new(),
        }
    }

    pub fn with_specialist(mut self, id: SpecialistId) -> Self {
        self.specialist_id = Some(id);
        self
    }

    pub fn with_work_location(mut self, id: WorkLocationId) -> Self {
        self.work_location_id = Some(id);
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }
}

/// The JSON envelope published on every channel: `{type, timestamp, data}`.
///
/// `timestamp` is Unix seconds so that browser and server clocks compare
/// directly in the stale check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub timestamp: i64,
    pub data: BookingSnapshot,
}

impl ChangeEnvelope {
    pub fn new(kind: ChangeKind, occurred_at: Timestamp, data: BookingSnapshot) -> Self {
        Self {
            kind,
            timestamp: occurred_at.as_unix_secs(),
            data,
        }
    }

    /// When the change was produced.
    pub fn occurred_at(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.timestamp)
    }

    /// Identity used to collapse duplicate deliveries of the same change.
    pub fn key(&self) -> EventKey {
        EventKey::for_change(self)
    }

    /// Serializes to the wire JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the wire JSON.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Dedup identity: `{timestamp}_{kind}_{entity}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    pub fn new(timestamp: i64, kind: &str, entity: impl fmt::Display) -> Self {
        Self(format!("{}_{}_{}", timestamp, kind, entity))
    }

    pub fn for_change(envelope: &ChangeEnvelope) -> Self {
        Self::new(envelope.timestamp, envelope.kind.as_str(), envelope.data.booking_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
