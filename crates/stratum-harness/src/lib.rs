#![forbid(unsafe_code)]

//! Test scaffolding: a scriptable in-memory host tree.
//!
//! [`FakeTree`] implements [`HostTree`] over plain data so engine tests can
//! attach/detach subtrees, move rects, and flip markers without a real
//! render tree. Combined with the engine's explicit `now` parameters, whole
//! scenarios run on a fabricated timeline with no sleeps.

use std::collections::HashMap;
use std::time::Duration;

use stratum_core::geometry::Rect;
use stratum_core::host::HostTree;
use stratum_core::node::NodeId;
use web_time::Instant;

/// Offset a base instant by milliseconds. Test timelines read as
/// `after(t0, 150)`.
#[inline]
#[must_use]
pub fn after(start: Instant, ms: u64) -> Instant {
    start + Duration::from_millis(ms)
}

/// One scripted node.
#[derive(Debug, Clone)]
pub struct FakeNode {
    /// Bounding box reported while attached and not hidden.
    pub rect: Rect,
    /// Layering value.
    pub layer: i32,
    /// Role marker, if any.
    pub marker: Option<String>,
    /// "Open" marker state.
    pub open: bool,
    /// Visibility flag.
    pub visible: bool,
    /// Hidden flag.
    pub hidden: bool,
    /// Attachment state.
    pub attached: bool,
    /// Direct children, in document order.
    pub children: Vec<NodeId>,
}

impl FakeNode {
    /// A plain attached node with the given geometry and layer.
    #[must_use]
    pub fn new(rect: Rect, layer: i32) -> Self {
        Self {
            rect,
            layer,
            marker: None,
            open: false,
            visible: true,
            hidden: false,
            attached: true,
            children: Vec::new(),
        }
    }

    /// Set the role marker.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Set the "open" marker.
    #[must_use]
    pub fn open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Set the visibility flag.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the hidden flag.
    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Start detached (used to script late attachment).
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }
}

/// Scriptable in-memory host tree.
#[derive(Debug, Default)]
pub struct FakeTree {
    nodes: HashMap<NodeId, FakeNode>,
    next_id: u64,
}

impl FakeTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root-level node, returning its id.
    pub fn insert(&mut self, node: FakeNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        let _ = self.nodes.insert(id, node);
        id
    }

    /// Insert a node as a child of `parent`, returning its id.
    ///
    /// The child inherits the parent's attachment state unless it was
    /// explicitly built detached.
    pub fn insert_child(&mut self, parent: NodeId, mut node: FakeNode) -> NodeId {
        if let Some(p) = self.nodes.get(&parent) {
            node.attached = node.attached && p.attached;
        }
        let id = self.insert(node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Mark a subtree attached.
    pub fn attach(&mut self, id: NodeId) {
        self.set_attached(id, true);
    }

    /// Mark a subtree detached.
    pub fn detach(&mut self, id: NodeId) {
        self.set_attached(id, false);
    }

    /// Drop a node entirely (it no longer answers to its id).
    pub fn remove(&mut self, id: NodeId) {
        let _ = self.nodes.remove(&id);
        for node in self.nodes.values_mut() {
            node.children.retain(|c| *c != id);
        }
    }

    /// Move or resize a node.
    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.rect = rect;
        }
    }

    /// Change a node's layering value.
    pub fn set_layer(&mut self, id: NodeId, layer: i32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.layer = layer;
        }
    }

    /// Flip the "open" marker.
    pub fn set_open(&mut self, id: NodeId, open: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.open = open;
        }
    }

    /// Flip the visibility flag.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// Flip the hidden flag.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.hidden = hidden;
        }
    }

    /// Inspect a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&FakeNode> {
        self.nodes.get(&id)
    }

    fn set_attached(&mut self, id: NodeId, attached: bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&current) {
                node.attached = attached;
                stack.extend(node.children.iter().copied());
            }
        }
    }
}

impl HostTree for FakeTree {
    fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.attached)
    }

    fn bounding_rect(&self, id: NodeId) -> Rect {
        match self.nodes.get(&id) {
            Some(n) if n.attached && !n.hidden => n.rect,
            _ => Rect::default(),
        }
    }

    fn layer_of(&self, id: NodeId) -> i32 {
        self.nodes.get(&id).map_or(0, |n| n.layer)
    }

    fn role_marker(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.marker.as_deref())
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes.get(&id).map_or_else(Vec::new, |n| n.children.clone())
    }

    fn has_open_marker(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.open)
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.visible)
    }

    fn is_hidden(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.hidden)
    }
}
