#![forbid(unsafe_code)]

//! The engine coordinator.
//!
//! One [`Engine`] owns the watcher registry, the conflict detector, the
//! layering-variable table, the node→variable bindings, and the event bus,
//! and wires host notifications onto them:
//!
//! - widget **open** → watch + bind + immediate detect/resolve; the caller
//!   reads the assigned layer back synchronously,
//! - widget **close** → unwatch + restore the original layer,
//! - **resize** → trailing-edge debounced full re-evaluation (cache
//!   invalidated),
//! - **scroll** → leading-edge throttled re-detection (an already-resolved
//!   subject is a no-op until new overlap appears),
//! - **tree mutations / attribute changes** → classification and
//!   activation tracking, with re-detection on any change that can affect
//!   the active set or overlap.
//!
//! Everything is single-threaded and cooperative: the host calls the entry
//! points from its own loop and pumps [`tick`](Engine::tick) for deferred
//! work (classification retries, due debounce fires). The engine is a
//! plain value; independent instances share nothing.

use std::time::Duration;

use stratum_core::host::{AttrChange, HostTree, MutationBatch};
use stratum_core::node::{NodeId, Role};
use stratum_core::vars::{LayerBindings, LayerKey, LayerVars, LayerVarsReader};
use stratum_detect::{Detector, DetectorConfig, DetectorStats, ResolutionLog};
use stratum_sched::{DebounceConfig, Debouncer, Throttle};
use stratum_watch::{MutationOutcome, Watcher, WatcherConfig};
use web_time::Instant;

use crate::events::{EngineEvent, EventBus, EventKind, HandlerId, HandlerResult};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Watcher settings (classification retry budget).
    pub watcher: WatcherConfig,
    /// Detector settings (cache TTL, escalation step, history size).
    pub detector: DetectorConfig,
    /// Debounce policy for resize re-evaluation.
    pub resize_debounce: DebounceConfig,
    /// Minimum interval between scroll re-detections.
    pub scroll_throttle: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            watcher: WatcherConfig::default(),
            detector: DetectorConfig::default(),
            // Trailing-edge, 100ms after the last resize of a burst.
            resize_debounce: DebounceConfig::default().with_delay(Duration::from_millis(100)),
            // One re-detection per frame at most.
            scroll_throttle: Duration::from_millis(16),
        }
    }
}

impl EngineConfig {
    /// Replace the watcher settings.
    #[must_use]
    pub fn with_watcher(mut self, watcher: WatcherConfig) -> Self {
        self.watcher = watcher;
        self
    }

    /// Replace the detector settings.
    #[must_use]
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Replace the resize debounce policy.
    #[must_use]
    pub fn with_resize_debounce(mut self, debounce: DebounceConfig) -> Self {
        self.resize_debounce = debounce;
        self
    }

    /// Replace the scroll throttle interval.
    #[must_use]
    pub fn with_scroll_throttle(mut self, limit: Duration) -> Self {
        self.scroll_throttle = limit;
        self
    }
}

/// Aggregated diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    /// Nodes currently in the watcher registry.
    pub watched: usize,
    /// Classification candidates awaiting retry.
    pub pending_retries: usize,
    /// Layering variables currently present.
    pub vars: usize,
    /// Detection cycles run.
    pub cycles: u64,
    /// Detector counters (cache, detections, resolutions, stale skips).
    pub detector: DetectorStats,
    /// Events dispatched on the bus.
    pub events_dispatched: u64,
    /// Handler errors observed (isolated, never fatal).
    pub handler_errors: u64,
}

/// The layering engine.
#[derive(Debug)]
pub struct Engine {
    watcher: Watcher,
    detector: Detector,
    bus: EventBus,
    vars: LayerVars,
    bindings: LayerBindings,
    resize_debounce: Debouncer,
    scroll_throttle: Throttle,
    cycles: u64,
}

impl Engine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            watcher: Watcher::new(config.watcher),
            detector: Detector::new(config.detector),
            bus: EventBus::new(),
            vars: LayerVars::new(),
            bindings: LayerBindings::new(),
            resize_debounce: Debouncer::new(config.resize_debounce),
            scroll_throttle: Throttle::new(config.scroll_throttle),
            cycles: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Widget lifecycle
    // -----------------------------------------------------------------------

    /// Register a widget's node on open and resolve immediately.
    ///
    /// Binds the node to the named layering variable, runs a detection
    /// cycle, and returns the value the widget should apply to its
    /// container: the escalated layer if the open caused a conflict, the
    /// original layer otherwise. Returns `None` only when the node is
    /// detached (a logged no-op).
    pub fn open(
        &mut self,
        tree: &dyn HostTree,
        id: NodeId,
        role: Role,
        key: impl Into<LayerKey>,
        now: Instant,
    ) -> Option<i32> {
        let key = key.into();
        if !self.watcher.watch(tree, id, role, now) {
            return None;
        }
        let original = self
            .watcher
            .watched(id)
            .map_or(0, |entry| entry.original_layer);
        self.bindings.bind(id, key.clone());
        // Seed the variable so read-back is defined even without conflicts.
        if self.vars.get(&key).is_none() {
            self.vars.set(key.clone(), original);
        }
        self.bus.dispatch(&EngineEvent::WidgetOpen {
            node: id,
            role,
            key: key.clone(),
        });
        self.run_cycle(tree, now);
        self.vars.get(&key)
    }

    /// Release a widget's node on close and restore its original layer.
    ///
    /// No-op if the node wasn't registered. Runs a detection cycle
    /// afterwards, since remaining overlays may have been conflicting with
    /// the departed node.
    pub fn close(&mut self, tree: &dyn HostTree, id: NodeId, now: Instant) {
        let Some(entry) = self.watcher.unwatch(id) else {
            return;
        };
        let restored = entry.original_layer;
        if let Some(key) = self.bindings.unbind(id) {
            self.vars.set(key, restored);
        }
        self.bus.dispatch(&EngineEvent::WidgetClose {
            node: id,
            restored_layer: restored,
        });
        self.run_cycle(tree, now);
    }

    // -----------------------------------------------------------------------
    // Host notifications
    // -----------------------------------------------------------------------

    /// Feed one batch of tree mutations.
    ///
    /// Added subtrees are classified (with descendants); candidates that
    /// are not yet attached are retried on subsequent ticks. Classified
    /// subjects that never bound a variable get a per-node default.
    pub fn on_mutations(&mut self, tree: &dyn HostTree, batch: &MutationBatch, now: Instant) {
        let outcome = self.watcher.on_tree_mutation(tree, batch, now);
        self.absorb(&outcome);
        if outcome.requires_detection() {
            self.run_cycle(tree, now);
        }
    }

    /// Feed an attribute-change notification.
    ///
    /// An activation flip, or a placement change on a watched node,
    /// triggers re-detection.
    pub fn on_attribute(
        &mut self,
        tree: &dyn HostTree,
        id: NodeId,
        kinds: AttrChange,
        now: Instant,
    ) {
        if let Some(flip) = self.watcher.on_attribute_change(tree, id, kinds, now) {
            if !self.watcher.is_watched(flip.node) {
                let _ = self.bindings.unbind(flip.node);
            }
            self.run_cycle(tree, now);
        } else if kinds.affects_placement() && self.watcher.is_watched(id) {
            self.run_cycle(tree, now);
        }
    }

    /// Feed a viewport resize notification (debounced).
    ///
    /// With the default trailing-edge policy the re-evaluation runs from
    /// [`tick`](Engine::tick) once the burst goes quiet.
    pub fn on_resize(&mut self, tree: &dyn HostTree, now: Instant) {
        if self.resize_debounce.signal(now) {
            self.full_reevaluate(tree, now);
        }
    }

    /// Feed a viewport scroll notification (throttled).
    ///
    /// Re-detection only: a subject whose variable already clears every
    /// candidate is left alone until new overlap appears.
    pub fn on_scroll(&mut self, tree: &dyn HostTree, now: Instant) {
        if self.scroll_throttle.allow(now) {
            self.run_cycle(tree, now);
            self.bus.dispatch(&EngineEvent::Scroll);
        }
    }

    /// Pump deferred work: classification retries and due debounce fires.
    ///
    /// The host calls this once per loop turn (or on a timer it schedules
    /// from [`Debouncer::next_deadline`]-style hints). A stale fire against
    /// nodes that have since closed or detached is a no-op.
    pub fn tick(&mut self, tree: &dyn HostTree, now: Instant) {
        let outcome = self.watcher.retry_pending(tree, now);
        self.absorb(&outcome);

        if self.resize_debounce.poll(now) {
            self.full_reevaluate(tree, now);
        } else if outcome.requires_detection() {
            self.run_cycle(tree, now);
        }
    }

    // -----------------------------------------------------------------------
    // Read-back and observation
    // -----------------------------------------------------------------------

    /// Read a layering variable.
    #[must_use]
    pub fn layer(&self, key: &LayerKey) -> Option<i32> {
        self.vars.get(key)
    }

    /// A borrow-free reader over the published variable snapshot.
    #[must_use]
    pub fn vars_reader(&self) -> LayerVarsReader {
        self.vars.reader()
    }

    /// The bounded resolution history.
    #[must_use]
    pub fn history(&self) -> &ResolutionLog {
        self.detector.history()
    }

    /// Register an event handler. See [`EventBus::on`].
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&EngineEvent) -> HandlerResult + 'static,
    {
        self.bus.on(kind, handler)
    }

    /// Unregister an event handler. See [`EventBus::off`].
    pub fn off(&mut self, id: HandlerId) -> bool {
        self.bus.off(id)
    }

    /// Whether a node is currently watched.
    #[must_use]
    pub fn is_watched(&self, id: NodeId) -> bool {
        self.watcher.is_watched(id)
    }

    /// Aggregated diagnostics.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            watched: self.watcher.len(),
            pending_retries: self.watcher.pending_retries(),
            vars: self.vars.len(),
            cycles: self.cycles,
            detector: self.detector.stats(),
            events_dispatched: self.bus.dispatched_count(),
            handler_errors: self.bus.handler_error_count(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Bind freshly classified subjects and release pruned ones.
    fn absorb(&mut self, outcome: &MutationOutcome) {
        for &id in &outcome.watched {
            if self.bindings.get(id).is_none()
                && let Some(entry) = self.watcher.watched(id)
            {
                self.bindings.bind(id, LayerKey::for_node(entry.role, id));
            }
        }
        for &id in &outcome.pruned {
            let _ = self.bindings.unbind(id);
        }
    }

    /// Full re-evaluation: drop cached detection results, then cycle.
    fn full_reevaluate(&mut self, tree: &dyn HostTree, now: Instant) {
        self.detector.invalidate();
        self.run_cycle(tree, now);
        self.bus.dispatch(&EngineEvent::Resize);
    }

    /// One detection cycle: snapshot, detect, resolve, announce.
    fn run_cycle(&mut self, tree: &dyn HostTree, now: Instant) {
        self.cycles += 1;
        let active = self.watcher.active_set(tree, now);
        let groups = self.detector.detect(&active, now);
        if groups.is_empty() {
            return;
        }
        let records = self
            .detector
            .resolve(tree, &groups, &self.bindings, &mut self.vars, now);
        if !records.is_empty() {
            self.bus.dispatch(&EngineEvent::ConflictsResolved { records });
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
