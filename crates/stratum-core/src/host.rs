#![forbid(unsafe_code)]

//! The engine's window into the external render tree.
//!
//! The host application owns the tree; the engine observes it through this
//! interface and never stores references into it. Every entry point takes
//! the tree by parameter, so a single engine can serve any number of
//! sequential snapshots and a stale id simply reads as detached.

use bitflags::bitflags;

use crate::geometry::Rect;
use crate::node::NodeId;

/// Read-only view of the host render tree.
///
/// Implementations must answer for any id, including ids that were never
/// part of the tree: unknown ids read as detached, with a zero-area rect
/// and layer 0. That contract is what lets the engine treat stale work as
/// a no-op instead of an error.
pub trait HostTree {
    /// Whether the node is currently attached to the tree.
    fn is_attached(&self, id: NodeId) -> bool;

    /// The node's bounding box in viewport coordinates.
    ///
    /// Detached or hidden nodes report a zero-area rect, which never
    /// overlaps anything.
    fn bounding_rect(&self, id: NodeId) -> Rect;

    /// The node's effective layering value.
    fn layer_of(&self, id: NodeId) -> i32;

    /// The node's role marker, if it carries one.
    fn role_marker(&self, id: NodeId) -> Option<&str>;

    /// Direct children of the node, in document order.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    /// Whether the node carries its "open" marker.
    fn has_open_marker(&self, id: NodeId) -> bool;

    /// Whether the node's visibility flag is set.
    fn is_visible(&self, id: NodeId) -> bool;

    /// Whether the node is explicitly hidden.
    fn is_hidden(&self, id: NodeId) -> bool;
}

/// One batch of tree mutations, delivered per host loop turn.
///
/// The whole batch is processed atomically before the engine yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Roots of newly added subtrees.
    pub added: Vec<NodeId>,
    /// Roots of removed subtrees.
    pub removed: Vec<NodeId>,
}

impl MutationBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an added subtree root.
    #[must_use]
    pub fn with_added(mut self, id: NodeId) -> Self {
        self.added.push(id);
        self
    }

    /// Record a removed subtree root.
    #[must_use]
    pub fn with_removed(mut self, id: NodeId) -> Self {
        self.removed.push(id);
        self
    }

    /// Whether the batch carries no mutations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

bitflags! {
    /// What changed in an attribute-change notification.
    ///
    /// Hosts may coalesce several changes into one notification, so this is
    /// a flag set rather than a single kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrChange: u8 {
        /// The "open" marker was added or removed.
        const OPEN_MARKER = 1 << 0;
        /// The visibility flag changed.
        const VISIBILITY = 1 << 1;
        /// The hidden flag changed.
        const HIDDEN = 1 << 2;
        /// The bounding box moved or resized.
        const GEOMETRY = 1 << 3;
        /// The node's own layering value changed.
        const LAYER = 1 << 4;
    }
}

impl AttrChange {
    /// Whether this change can flip the given activation predicate.
    #[must_use]
    pub fn affects_activation(self, activation: crate::node::Activation) -> bool {
        use crate::node::Activation;
        match activation {
            Activation::OpenMarker => self.contains(Self::OPEN_MARKER),
            Activation::VisibleFlag => self.contains(Self::VISIBILITY),
            Activation::NotHidden => self.contains(Self::HIDDEN),
        }
    }

    /// Whether this change can alter overlap or layering without flipping
    /// activation.
    #[must_use]
    pub fn affects_placement(self) -> bool {
        self.intersects(Self::GEOMETRY | Self::LAYER)
    }
}
