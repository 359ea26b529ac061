#![forbid(unsafe_code)]

//! Time source.
//!
//! Every time-driven API in the engine takes an explicit `now` instant
//! instead of reading a clock internally, so tests fabricate timelines with
//! plain `Duration` arithmetic and never sleep. `web_time` keeps the same
//! types working on wasm targets, where `std::time::Instant` is
//! unavailable.

pub use std::time::Duration;
pub use web_time::Instant;

/// Read the wall clock. Embedders call this once per host-loop turn and
/// thread the value through the engine.
#[inline]
#[must_use]
pub fn now() -> Instant {
    Instant::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instants_are_orderable_and_offsetable() {
        let t0 = now();
        let t1 = t0 + Duration::from_millis(100);
        assert!(t1 > t0);
        assert_eq!(t1.duration_since(t0), Duration::from_millis(100));
    }

    #[test]
    fn duration_since_saturates_backwards() {
        let t0 = now();
        let t1 = t0 + Duration::from_millis(5);
        assert_eq!(t0.checked_duration_since(t1), None);
    }
}
