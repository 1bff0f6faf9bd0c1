//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Relay Ports
//!
//! - `EventQueue` - Durable queue table written by every mutation path
//! - `ChangeSource` - Strategy that yields the next batch of changes
//! - `BookingSnapshotReader` - Current bookings, for snapshot diffing
//! - `ChangePublisher` - Publishes a change on a broker channel
//! - `VersionStore` - Coarse counters behind the version endpoint
//!
//! ## Client Ports
//!
//! - `StreamConnector` - Opens the push stream
//! - `VersionFetcher` - Calls the version endpoint
//! - `KeyValueStore` - State that survives a reload
//! - `Clock` - Wall-clock time

mod booking_snapshot_reader;
mod change_publisher;
mod change_source;
mod clock;
mod event_queue;
mod key_value_store;
mod stream_connector;
mod version_fetcher;
mod version_store;

pub use booking_snapshot_reader::{BookingRecord, BookingSnapshotReader};
pub use change_publisher::ChangePublisher;
pub use change_source::{ChangeSource, Settlement, SourcedChange};
pub use clock::Clock;
pub use event_queue::EventQueue;
pub use key_value_store::{KeyValueError, KeyValueStore};
pub use stream_connector::{FrameStream, StreamConnector, StreamFrame, TransportError};
pub use version_fetcher::VersionFetcher;
pub use version_store::VersionStore;
