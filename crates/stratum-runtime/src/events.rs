#![forbid(unsafe_code)]

//! Domain lifecycle events and the synchronous handler bus.
//!
//! Handlers run synchronously, in registration order, on the thread that
//! dispatched. A failing handler is logged and isolated; its siblings still
//! run. Handlers return [`Result`] rather than panicking; the bus makes no
//! attempt to catch unwinds, it isolates the error channel the engine
//! actually uses.

use stratum_core::error::EngineError;
use stratum_core::node::{NodeId, Role};
use stratum_core::vars::LayerKey;
use stratum_detect::ResolutionRecord;

/// What handlers return.
pub type HandlerResult = Result<(), EngineError>;

/// The closed set of lifecycle events the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A widget opened and its node was registered.
    WidgetOpen,
    /// A widget closed and its node was released.
    WidgetClose,
    /// The viewport resized (post-debounce re-evaluation ran).
    Resize,
    /// The viewport scrolled (post-throttle re-detection ran).
    Scroll,
    /// A detection cycle landed one or more resolutions.
    ConflictsResolved,
}

/// A lifecycle event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A widget opened.
    WidgetOpen {
        /// The registered node.
        node: NodeId,
        /// Its classified role.
        role: Role,
        /// The layering variable it was bound to.
        key: LayerKey,
    },
    /// A widget closed.
    WidgetClose {
        /// The released node.
        node: NodeId,
        /// The layering value restored to its variable.
        restored_layer: i32,
    },
    /// A debounced resize re-evaluation completed.
    Resize,
    /// A throttled scroll re-detection completed.
    Scroll,
    /// Resolutions landed this cycle, in resolution order.
    ConflictsResolved {
        /// The records, as also appended to the history ring.
        records: Vec<ResolutionRecord>,
    },
}

impl EngineEvent {
    /// The kind used for handler routing.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WidgetOpen { .. } => EventKind::WidgetOpen,
            Self::WidgetClose { .. } => EventKind::WidgetClose,
            Self::Resize => EventKind::Resize,
            Self::Scroll => EventKind::Scroll,
            Self::ConflictsResolved { .. } => EventKind::ConflictsResolved,
        }
    }
}

/// Opaque handle for unregistering a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&EngineEvent) -> HandlerResult>;

struct HandlerEntry {
    id: HandlerId,
    kind: EventKind,
    handler: Handler,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Synchronous event bus.
#[derive(Debug, Default)]
pub struct EventBus {
    handlers: Vec<HandlerEntry>,
    next_id: u64,
    dispatched: u64,
    handler_errors: u64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. Returns the id to pass to
    /// [`off`](EventBus::off).
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&EngineEvent) -> HandlerResult + 'static,
    {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push(HandlerEntry {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Unregister a handler. Returns whether it existed.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|entry| entry.id != id);
        self.handlers.len() != before
    }

    /// Dispatch an event to every handler registered for its kind, in
    /// registration order. Returns how many handlers ran.
    ///
    /// A handler error is logged and counted; it never blocks siblings.
    pub fn dispatch(&mut self, event: &EngineEvent) -> usize {
        let kind = event.kind();
        let mut invoked = 0;
        for entry in &mut self.handlers {
            if entry.kind != kind {
                continue;
            }
            invoked += 1;
            if let Err(err) = (entry.handler)(event) {
                self.handler_errors += 1;
                tracing::warn!(?kind, error = %err, "event handler failed");
            }
        }
        self.dispatched += 1;
        invoked
    }

    /// Number of handlers registered for a kind.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.iter().filter(|e| e.kind == kind).count()
    }

    /// Total events dispatched (diagnostic).
    #[must_use]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched
    }

    /// Total handler errors observed (diagnostic).
    #[must_use]
    pub fn handler_error_count(&self) -> u64 {
        self.handler_errors
    }
}
