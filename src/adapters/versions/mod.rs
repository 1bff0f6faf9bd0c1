//! Version counter adapters that do not need Redis.

mod in_memory;

pub use in_memory::InMemoryVersionStore;
