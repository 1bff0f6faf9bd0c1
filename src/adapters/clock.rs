//! Clock adapters.
//!
//! - `SystemClock` reads the OS wall clock.
//! - `TokioClock` advances with the tokio timer, so paused-time tests see
//!   wall time move in step with `tokio::time::sleep`.
//! - `ManualClock` only moves when told to.

use std::sync::RwLock;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Wall time derived from an anchor plus elapsed tokio time.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: Timestamp,
    started: Instant,
}

impl TokioClock {
    /// Anchored at the current system time.
    pub fn new() -> Self {
        Self::anchored_at(Timestamp::now())
    }

    /// Anchored at a fixed wall time (deterministic tests).
    pub fn anchored_at(anchor: Timestamp) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        self.anchor.plus(self.started.elapsed())
    }
}

/// A clock that stands still until advanced.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.plus(by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(Timestamp::from_unix_secs(100));
        assert_eq!(clock.now().as_unix_secs(), 100);

        clock.advance(Duration::from_secs(61 * 60));
        assert_eq!(clock.now().as_unix_secs(), 100 + 61 * 60);

        clock.set(Timestamp::from_unix_secs(5));
        assert_eq!(clock.now().as_unix_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::anchored_at(Timestamp::from_unix_millis(1_000));
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now().as_unix_millis(), 3_500);
    }
}
