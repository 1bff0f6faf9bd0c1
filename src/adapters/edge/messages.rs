//! Server-sent event payloads of the stream endpoint.
//!
//! Three event names are emitted:
//! - `connected` once, echoing the channel the client joined
//! - `heartbeat` periodically, so clients can detect half-open connections
//! - `message` per booking change, carrying the envelope JSON verbatim

use serde::{Deserialize, Serialize};

use crate::domain::booking::ChannelAddress;
use crate::domain::foundation::{ClientId, Timestamp};

pub const EVENT_CONNECTED: &str = "connected";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_MESSAGE: &str = "message";

/// Sent when a client successfully joins a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedEvent {
    pub status: String,
    pub scope: String,
    pub id: String,
    pub client_id: String,
    /// Unix seconds.
    pub timestamp: i64,
}

impl ConnectedEvent {
    pub fn new(channel: &ChannelAddress, client_id: &ClientId, at: Timestamp) -> Self {
        Self {
            status: "connected".to_string(),
            scope: channel.scope().to_string(),
            id: channel.id(),
            client_id: client_id.to_string(),
            timestamp: at.as_unix_secs(),
        }
    }
}

/// Keep-alive payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    /// Unix seconds.
    pub time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SpecialistId;

    #[test]
    fn connected_event_echoes_scope_and_id() {
        let channel = ChannelAddress::Specialist(SpecialistId::new(12));
        let event = ConnectedEvent::new(&channel, &ClientId::new(), Timestamp::from_unix_secs(50));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "connected");
        assert_eq!(value["scope"], "specialist");
        assert_eq!(value["id"], "12");
        assert_eq!(value["timestamp"], 50);
    }

    #[test]
    fn heartbeat_serializes_time() {
        let json = serde_json::to_string(&HeartbeatEvent { time: 7 }).unwrap();
        assert_eq!(json, r#"{"time":7}"#);
    }
}
