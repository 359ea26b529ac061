#![forbid(unsafe_code)]

//! Burst debouncing with an optional hard deadline.
//!
//! A [`Debouncer`] collapses a burst of signals into at most one leading
//! and one trailing fire. The owner calls [`signal`](Debouncer::signal)
//! whenever input arrives and [`poll`](Debouncer::poll) on its tick cadence;
//! both take `now` explicitly, so the whole schedule is deterministic.
//!
//! # Semantics
//!
//! - **Trailing (default)**: one fire, `delay` after the last signal of the
//!   burst.
//! - **Leading**: fire on the first signal of a burst; a trailing fire then
//!   happens only if at least one further signal arrived inside the window.
//! - **`max_wait`**: under continuous signaling the trailing fire can be
//!   postponed forever; a max wait forces a fire once that much time has
//!   passed since the burst began, then restarts the window.

use std::time::Duration;

use web_time::Instant;

/// Configuration for a [`Debouncer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet period that ends a burst.
    pub delay: Duration,
    /// Fire on the first signal of a burst.
    pub leading: bool,
    /// Fire after the burst goes quiet.
    pub trailing: bool,
    /// Upper bound on how long a trailing fire may be postponed while
    /// signals keep arriving.
    pub max_wait: Option<Duration>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

impl DebounceConfig {
    /// Set the quiet period.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enable or disable the leading-edge fire.
    #[must_use]
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Enable or disable the trailing-edge fire.
    #[must_use]
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Bound trailing postponement under continuous input.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Stateful debouncer with an injectable clock.
#[derive(Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    /// First signal of the current burst.
    burst_started: Option<Instant>,
    /// Most recent signal.
    last_signal: Option<Instant>,
    /// A trailing fire is owed for the current burst.
    trailing_armed: bool,
    fires: u64,
}

impl Debouncer {
    /// Create a debouncer with the given configuration.
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            burst_started: None,
            last_signal: None,
            trailing_armed: false,
            fires: 0,
        }
    }

    /// Trailing-only debouncer with the given quiet period.
    #[must_use]
    pub fn trailing(delay: Duration) -> Self {
        Self::new(DebounceConfig::default().with_delay(delay))
    }

    /// Record a signal. Returns `true` when the leading edge should fire
    /// immediately.
    pub fn signal(&mut self, now: Instant) -> bool {
        // A signal arriving after the quiet period with nothing armed
        // starts a fresh burst even if the owner never polled in between.
        // (An armed trailing fire is not dropped here; it surfaces at the
        // next poll once the extended burst finally goes quiet.)
        if let Some(last) = self.last_signal
            && !self.trailing_armed
            && elapsed(now, last) >= self.config.delay
        {
            self.reset();
        }
        let starts_burst = self.burst_started.is_none();
        if starts_burst {
            self.burst_started = Some(now);
        }
        self.last_signal = Some(now);

        if starts_burst && self.config.leading {
            self.fires += 1;
            return true;
        }
        self.trailing_armed = self.config.trailing;
        false
    }

    /// Check for due work. Returns `true` when the trailing edge (or the
    /// max-wait deadline) should fire now.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_signal else {
            return false;
        };

        if let Some(max_wait) = self.config.max_wait
            && let Some(started) = self.burst_started
            && elapsed(now, started) >= max_wait
            && self.trailing_armed
        {
            // Forced periodic fire under continuous input; the window
            // restarts so the next deadline is max_wait from now.
            self.trailing_armed = false;
            self.burst_started = Some(now);
            self.fires += 1;
            return true;
        }

        if elapsed(now, last) >= self.config.delay {
            let fire = self.trailing_armed;
            self.reset();
            if fire {
                self.fires += 1;
            }
            return fire;
        }
        false
    }

    /// Discard any pending fire and end the current burst.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Fire immediately if a trailing fire is pending. Returns whether a
    /// fire happened.
    pub fn flush(&mut self) -> bool {
        let fire = self.trailing_armed;
        self.reset();
        if fire {
            self.fires += 1;
        }
        fire
    }

    /// Whether a trailing fire is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.trailing_armed
    }

    /// When the next fire would be due, if any work is pending.
    ///
    /// Hosts that schedule real timers can use this to avoid polling.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let last = self.last_signal?;
        let quiet = last + self.config.delay;
        if !self.trailing_armed {
            // Still tracking the burst for leading-edge reset purposes.
            return Some(quiet);
        }
        match (self.config.max_wait, self.burst_started) {
            (Some(max_wait), Some(started)) => Some(quiet.min(started + max_wait)),
            _ => Some(quiet),
        }
    }

    /// Total fires so far (diagnostic).
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.fires
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    fn reset(&mut self) {
        self.burst_started = None;
        self.last_signal = None;
        self.trailing_armed = false;
    }
}

#[inline]
fn elapsed(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}
