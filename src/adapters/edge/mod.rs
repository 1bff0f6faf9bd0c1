//! Streaming edge service.
//!
//! Terminates long-lived server-sent event connections and serves the
//! version endpoint used by polling clients.
//!
//! ```text
//!   Redis (bookings:*) ──► RedisRelay ──► ChannelHub ──► /events/:scope/:id
//!                                                        (one SSE per tab)
//!   VersionStore ─────────────────────────────────────► /versions
//! ```
//!
//! # Components
//!
//! - [`hub`] - Channel fanout to connected clients
//! - [`messages`] - Event payloads
//! - [`stream`] - SSE handler
//! - [`versions`] - Version and health handlers
//! - [`routes`] - Router assembly

pub mod hub;
pub mod messages;
pub mod routes;
pub mod state;
pub mod stream;
pub mod versions;

pub use hub::{ChannelHub, HubMessage};
pub use messages::{ConnectedEvent, HeartbeatEvent, EVENT_CONNECTED, EVENT_HEARTBEAT, EVENT_MESSAGE};
pub use routes::edge_router;
pub use state::{EdgeApiError, EdgeState, DEFAULT_HEARTBEAT_INTERVAL};
pub use stream::{open_stream, stream_handler};
pub use versions::{HealthResponse, VersionResponse};
