//! Event queue adapters that do not need a database.

mod in_memory;

pub use in_memory::InMemoryEventQueue;
