//! Redis adapters - broker publishing, subscription relay, version counters.
//!
//! Channels are named `bookings:{scope}:{id}`; counters live under
//! `bookings:version[:{scope}:{id}]`.

mod broker;
mod keys;
mod relay;
mod version_store;

pub use broker::RedisBroker;
pub use keys::channel_pattern;
pub use relay::RedisRelay;
pub use version_store::RedisVersionStore;
