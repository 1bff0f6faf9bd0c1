//! Reconnect backoff for the push stream.

use std::time::Duration;

pub const BACKOFF_FLOOR: Duration = Duration::from_secs(1);
pub const BACKOFF_CEILING: Duration = Duration::from_secs(30);
/// Failures tolerated before the stream is abandoned for polling.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// What to do after a stream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Try the stream again after this delay.
    Retry(Duration),
    /// Too many consecutive failures; switch to polling.
    GiveUp,
}

/// Doubling delay between reconnects: after the k-th consecutive failure the
/// delay is `min(floor * 2^k, ceiling)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectBackoff {
    attempts: u32,
    delay: Duration,
    max_attempts: u32,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            delay: BACKOFF_FLOOR,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Consecutive failures since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay computed for the most recent failure (the floor after a reset).
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stream opened: forget past failures.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay = BACKOFF_FLOOR;
    }

    pub fn record_failure(&mut self) -> BackoffDecision {
        self.attempts = self.attempts.saturating_add(1);
        self.delay = (self.delay * 2).min(BACKOFF_CEILING);

        if self.attempts > self.max_attempts {
            BackoffDecision::GiveUp
        } else {
            BackoffDecision::Retry(self.delay)
        }
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn five_retries_then_give_up() {
        let mut backoff = ReconnectBackoff::new();
        let delays: Vec<_> = (0..5)
            .map(|_| match backoff.record_failure() {
                BackoffDecision::Retry(d) => d.as_millis() as u64,
                BackoffDecision::GiveUp => panic!("gave up early"),
            })
            .collect();

        assert_eq!(delays, vec![2_000, 4_000, 8_000, 16_000, 30_000]);
        assert_eq!(backoff.record_failure(), BackoffDecision::GiveUp);
        assert_eq!(backoff.attempts(), 6);
    }

    #[test]
    fn reset_restores_the_floor() {
        let mut backoff = ReconnectBackoff::new();
        backoff.record_failure();
        backoff.record_failure();
        backoff.reset();

        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.delay(), BACKOFF_FLOOR);
        assert_eq!(backoff.record_failure(), BackoffDecision::Retry(Duration::from_secs(2)));
    }

    proptest! {
        #[test]
        fn kth_delay_matches_closed_form(k in 1u32..=5) {
            let mut backoff = ReconnectBackoff::new();
            let mut last = BackoffDecision::GiveUp;
            for _ in 0..k {
                last = backoff.record_failure();
            }
            let expected = (1_000u64 << k).min(30_000);
            prop_assert_eq!(last, BackoffDecision::Retry(Duration::from_millis(expected)));
        }

        #[test]
        fn delay_never_exceeds_ceiling(failures in 0usize..64) {
            let mut backoff = ReconnectBackoff::new();
            for _ in 0..failures {
                backoff.record_failure();
            }
            prop_assert!(backoff.delay() <= BACKOFF_CEILING);
            prop_assert!(backoff.delay() >= BACKOFF_FLOOR);
        }
    }
}
