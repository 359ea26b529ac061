#![forbid(unsafe_code)]

//! Leading-edge rate limiting.

use std::time::Duration;

use web_time::Instant;

/// Leading-edge throttle: the first call fires immediately, then further
/// calls are suppressed until `limit` has elapsed since the last fire.
///
/// Driven entirely by the injected `now`; continuous calls over a span of
/// `n * limit` fire at most `n + 1` times.
#[derive(Debug)]
pub struct Throttle {
    limit: Duration,
    last_fire: Option<Instant>,
    fires: u64,
    suppressed: u64,
}

impl Throttle {
    /// Create a throttle with the given minimum interval between fires.
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last_fire: None,
            fires: 0,
            suppressed: 0,
        }
    }

    /// Ask whether a call may fire now. Fires count from the moment they
    /// are allowed, not from the suppressed attempts in between.
    pub fn allow(&mut self, now: Instant) -> bool {
        let due = match self.last_fire {
            None => true,
            Some(last) => {
                now.checked_duration_since(last)
                    .unwrap_or(Duration::ZERO)
                    >= self.limit
            }
        };
        if due {
            self.last_fire = Some(now);
            self.fires += 1;
        } else {
            self.suppressed += 1;
        }
        due
    }

    /// Forget the last fire so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_fire = None;
    }

    /// The configured minimum interval.
    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Total allowed fires (diagnostic).
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.fires
    }

    /// Total suppressed calls (diagnostic).
    #[must_use]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}
