#![forbid(unsafe_code)]

//! Engine error taxonomy.
//!
//! Nothing here is fatal: invalid-node and timeout conditions are logged
//! and treated as no-ops inside the engine, and handler failures are
//! isolated per handler. The worst case is a missed resolution, never a
//! crash. The types exist so that logs and event handlers can carry a
//! structured reason.

use std::fmt;

use crate::node::NodeId;

/// Non-fatal engine error conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An operation targeted a node that is missing or detached from the
    /// host tree. Treated as a no-op.
    InvalidNode(NodeId),

    /// A mutation candidate never attached within the retry budget and was
    /// dropped.
    ClassificationTimeout(NodeId),

    /// A registered event handler failed. Logged and isolated; sibling
    /// handlers still run.
    Handler(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNode(id) => write!(f, "node {id} is missing or detached"),
            Self::ClassificationTimeout(id) => {
                write!(f, "node {id} never attached within the retry budget")
            }
            Self::Handler(msg) => write!(f, "handler failed: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Convenience constructor for handler failures.
    #[must_use]
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}
