#![forbid(unsafe_code)]

//! Stratum public facade crate.
//!
//! Re-exports the stable surface area from the internal crates and offers a
//! lightweight prelude. Most embedders only need [`Engine`], a [`HostTree`]
//! implementation over their render tree, and the [`Role`] of each overlay
//! widget they open.

// --- Core re-exports -------------------------------------------------------

pub use stratum_core::active::{ActiveNode, ActiveSet};
pub use stratum_core::error::EngineError;
pub use stratum_core::geometry::Rect;
pub use stratum_core::host::{AttrChange, HostTree, MutationBatch};
pub use stratum_core::node::{Activation, NodeId, Role};
pub use stratum_core::vars::{LayerBindings, LayerKey, LayerVars, LayerVarsReader};

/// Time source re-exports; see `stratum_core::clock`.
pub mod clock {
    pub use stratum_core::clock::{Duration, Instant, now};
}

// --- Scheduling re-exports -------------------------------------------------

pub use stratum_sched::{BatchQueue, CacheStats, DebounceConfig, Debouncer, Throttle, TtlCache};

// --- Watcher re-exports ----------------------------------------------------

pub use stratum_watch::{ActivationFlip, MutationOutcome, WatchedNode, Watcher, WatcherConfig};

// --- Detector re-exports ---------------------------------------------------

pub use stratum_detect::{
    Conflict, ConflictGroup, Detector, DetectorConfig, DetectorStats, ResolutionLog,
    ResolutionRecord,
};

// --- Runtime re-exports ----------------------------------------------------

pub use stratum_runtime::{
    Engine, EngineConfig, EngineEvent, EngineStats, EventBus, EventKind, HandlerId, HandlerResult,
};

/// Convenience prelude for embedders.
pub mod prelude {
    pub use crate::clock::{Duration, Instant};
    pub use crate::{
        AttrChange, Engine, EngineConfig, EngineEvent, EventKind, HostTree, LayerKey,
        MutationBatch, NodeId, Rect, Role,
    };
}
