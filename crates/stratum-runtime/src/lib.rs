#![forbid(unsafe_code)]

//! Runtime: the event bus and the [`Engine`] coordinator.
//!
//! The engine owns every registry (watcher, detector, layering variables,
//! bindings) and wires the host's lifecycle notifications onto them with
//! the debounce/throttle policies the widgets expect. It is a plain value:
//! no globals, no singletons, any number of independent engines.

pub mod engine;
pub mod events;

pub use engine::{Engine, EngineConfig, EngineStats};
pub use events::{EngineEvent, EventBus, EventKind, HandlerId, HandlerResult};
