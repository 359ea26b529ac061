#![forbid(unsafe_code)]

//! Node identity and overlay roles.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::Serialize;

/// Identity of a node in the external render tree.
///
/// The engine never holds references into the host tree; every association
/// is keyed by `NodeId` and the tree's own lifecycle governs destruction.
/// The host assigns ids; they only need to be stable and unique for the
/// lifetime of the node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Derive an id from hashable content.
    ///
    /// Useful for hosts whose nodes carry stable string keys rather than
    /// numeric ids.
    #[inline]
    pub fn from_hash<T: Hash>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Overlay role of a watched node.
///
/// The role set is closed: classification matches a node's role marker
/// against this fixed table, and each role carries the activation predicate
/// that decides membership in the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// A picker elevated out of normal paint order via a portal.
    ///
    /// Only this role is ever a conflict *subject*: the other roles
    /// participate as candidates but are never reassigned.
    OverlaySelector,
    /// A modal dialog.
    Modal,
    /// A dropdown menu.
    Dropdown,
    /// A hover tooltip.
    Tooltip,
}

impl Role {
    /// All roles, in marker-table order.
    pub const ALL: [Role; 4] = [
        Role::OverlaySelector,
        Role::Modal,
        Role::Dropdown,
        Role::Tooltip,
    ];

    /// Get the stable string representation (also the role marker).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OverlaySelector => "overlay-selector",
            Self::Modal => "modal",
            Self::Dropdown => "dropdown",
            Self::Tooltip => "tooltip",
        }
    }

    /// Classify a role marker against the fixed marker set.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "overlay-selector" => Some(Self::OverlaySelector),
            "modal" => Some(Self::Modal),
            "dropdown" => Some(Self::Dropdown),
            "tooltip" => Some(Self::Tooltip),
            _ => None,
        }
    }

    /// The activation predicate this role is judged by.
    #[must_use]
    pub const fn activation(self) -> Activation {
        match self {
            Self::OverlaySelector | Self::Dropdown => Activation::OpenMarker,
            Self::Modal => Activation::VisibleFlag,
            Self::Tooltip => Activation::NotHidden,
        }
    }

    /// Whether this role is elevated out of normal paint order and can be a
    /// conflict subject.
    #[inline]
    #[must_use]
    pub const fn is_subject(self) -> bool {
        matches!(self, Self::OverlaySelector)
    }

    /// Evaluate this role's activation predicate against the host tree.
    ///
    /// Always evaluated fresh; callers must not cache the result across
    /// external mutations. A detached node is never active.
    #[must_use]
    pub fn is_active(self, tree: &dyn crate::host::HostTree, id: NodeId) -> bool {
        if !tree.is_attached(id) {
            return false;
        }
        match self.activation() {
            Activation::OpenMarker => tree.has_open_marker(id),
            Activation::VisibleFlag => tree.is_visible(id),
            Activation::NotHidden => !tree.is_hidden(id),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a role decides whether a node is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Active while the node carries its "open" marker.
    OpenMarker,
    /// Active while the node's visibility flag is set.
    VisibleFlag,
    /// Active unless the node is explicitly hidden.
    NotHidden,
}
