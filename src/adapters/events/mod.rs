//! Relay adapters - change sources and the service that publishes them.

mod change_relay;
mod diff_monitor;
mod in_memory;
mod queue_source;

pub use change_relay::{BatchReport, ChangeRelay, ChangeRelayConfig, DeliveryPolicy};
pub use diff_monitor::DiffMonitor;
pub use in_memory::InMemoryBroker;
pub use queue_source::{QueueChangeSource, DEFAULT_RETENTION};
