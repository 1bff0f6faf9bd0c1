//! Application layer - Client-side orchestration over the ports.
//!
//! The relay and edge services are adapters; what remains here is the
//! delivery library a viewer embeds.

pub mod realtime;

pub use realtime::{
    ClientUpdate, ConnectionMode, ConnectionStatus, RealtimeClient, RealtimeOptions,
    RefreshThrottle,
};
