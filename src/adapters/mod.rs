//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Queue table and booking reads (PostgreSQL)
//! - `queue` - In-memory event queue
//! - `events` - Change sources and the relay that publishes them
//! - `redis` - Broker, subscription relay and version counters
//! - `versions` - In-memory version counters
//! - `edge` - SSE and version HTTP endpoints
//! - `client` - HTTP transports for the client library
//! - `storage` - Client session key-value stores
//! - `clock` - Wall-clock implementations

pub mod client;
pub mod clock;
pub mod edge;
pub mod events;
pub mod postgres;
pub mod queue;
pub mod redis;
pub mod storage;
pub mod versions;

pub use client::{HttpStreamConnector, HttpVersionFetcher};
pub use clock::{ManualClock, SystemClock, TokioClock};
pub use edge::{edge_router, ChannelHub, EdgeState};
pub use events::{
    BatchReport, ChangeRelay, ChangeRelayConfig, DeliveryPolicy, DiffMonitor, InMemoryBroker,
    QueueChangeSource,
};
pub use queue::InMemoryEventQueue;
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore};
pub use versions::InMemoryVersionStore;
