//! Client delivery library.
//!
//! Keeps a calendar view current: [`RealtimeClient`] runs the push stream
//! with reconnect backoff and falls back to adaptive version polling;
//! [`RefreshThrottle`] turns the resulting updates into deduplicated,
//! debounced, rate-limited refreshes.

mod adaptive;
mod backoff;
mod client;
mod mode;
mod throttle;
mod update;

pub use adaptive::{AdaptiveInterval, POLL_CEILING, POLL_FLOOR};
pub use backoff::{
    BackoffDecision, ReconnectBackoff, BACKOFF_CEILING, BACKOFF_FLOOR, MAX_RECONNECT_ATTEMPTS,
};
pub use client::{ClientSnapshot, RealtimeClient, RealtimeOptions};
pub use mode::{ConnectionMode, ConnectionStatus};
pub use throttle::{
    LastChange, Refresh, RefreshThrottle, ThrottleOutcome, DEBOUNCE_WINDOW, DEDUP_WINDOW_SECS,
    LAST_CHANGE_KEY, LAST_REFRESH_KEY, PROCESSED_EVENTS_KEY, REFRESH_COOLDOWN, STALE_AFTER_SECS,
};
pub use update::{ClientUpdate, FnUpdateHandler, LogStatusListener, StatusListener, UpdateHandler};
