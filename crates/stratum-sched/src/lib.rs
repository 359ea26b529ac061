#![forbid(unsafe_code)]

//! Scheduling primitives: debounce, throttle, TTL caching, and per-tick
//! batch queues.
//!
//! Everything here is an explicit stateful object driven by an injected
//! `now` instant. Nothing spawns threads, registers timers, or reads the
//! clock: the owner signals input as it arrives and polls for due work on
//! its own cadence, which makes every timing behavior deterministic under
//! test.

pub mod batch;
pub mod debounce;
pub mod throttle;
pub mod ttl_cache;

pub use batch::BatchQueue;
pub use debounce::{DebounceConfig, Debouncer};
pub use throttle::Throttle;
pub use ttl_cache::{CacheStats, TtlCache};
