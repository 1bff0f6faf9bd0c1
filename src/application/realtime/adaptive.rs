//! Polling interval that backs off while nothing changes.

use std::time::Duration;

pub const POLL_FLOOR: Duration = Duration::from_secs(5);
pub const POLL_CEILING: Duration = Duration::from_secs(30);
const GROWTH_FACTOR: f64 = 1.5;
/// Quiet polls tolerated before the interval starts growing.
const QUIET_POLLS_BEFORE_GROWTH: u32 = 3;

/// Interval between version polls.
///
/// After more than three consecutive unchanged polls each further quiet poll
/// multiplies the interval by 1.5 up to the ceiling. Any change snaps it back
/// to the floor. With `floor == ceiling` this is a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveInterval {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
    quiet_polls: u32,
}

impl AdaptiveInterval {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
            quiet_polls: 0,
        }
    }

    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, interval)
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn quiet_polls(&self) -> u32 {
        self.quiet_polls
    }

    pub fn record_change(&mut self) {
        self.reset();
    }

    pub fn record_no_change(&mut self) {
        self.quiet_polls = self.quiet_polls.saturating_add(1);
        if self.quiet_polls > QUIET_POLLS_BEFORE_GROWTH {
            self.current = self.current.mul_f64(GROWTH_FACTOR).min(self.ceiling);
        }
    }

    pub fn reset(&mut self) {
        self.current = self.floor;
        self.quiet_polls = 0;
    }
}

impl Default for AdaptiveInterval {
    fn default() -> Self {
        Self::new(POLL_FLOOR, POLL_CEILING)
    }
}
