//! Booking change vocabulary: kinds, envelopes, queue rows, channel addresses
//! and version counters.

mod change;
mod channel;
mod queue_event;
mod version;

pub use change::{BookingSnapshot, ChangeEnvelope, ChangeKind, EventKey};
pub use channel::{ChannelAddress, ChannelScope, ADMIN_CHANNEL_ID, CHANNEL_PREFIX};
pub use queue_event::QueueEvent;
pub use version::{VersionQuery, VersionSnapshot};
