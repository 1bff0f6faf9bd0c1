//! Storage Adapters
//!
//! Implementations of the KeyValueStore port for client session state.
//!
//! ## Available Adapters
//!
//! - **FileKeyValueStore** - Stores values in a JSON file on disk
//! - **InMemoryKeyValueStore** - Stores values in memory (testing)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileKeyValueStore, InMemoryKeyValueStore};
//!
//! // Watcher process: survive restarts
//! let store = FileKeyValueStore::new("./data/watcher-state.json");
//!
//! // Testing: in-memory storage
//! let store = InMemoryKeyValueStore::new();
//! ```

mod file_kv_store;
mod in_memory_kv_store;

pub use file_kv_store::FileKeyValueStore;
pub use in_memory_kv_store::InMemoryKeyValueStore;
