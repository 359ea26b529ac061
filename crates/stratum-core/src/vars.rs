#![forbid(unsafe_code)]

//! Named global layering variables.
//!
//! The engine's only output surface: a small table of named integer
//! layering values that rendered overlays apply to their containers. The
//! table is owned and mutated by the engine coordinator, one synchronous
//! call at a time; a published snapshot lets widget code read assignments
//! without borrowing the engine.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use arc_swap::ArcSwap;
use serde::Serialize;

use crate::node::{NodeId, Role};

/// Name of one global layering variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerKey(String);

impl LayerKey {
    /// Create a key from a variable name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Default per-node key for subjects that were classified from tree
    /// mutations and never bound an explicit variable.
    #[must_use]
    pub fn for_node(role: Role, id: NodeId) -> Self {
        Self(format!("{}{}", role.as_str(), id))
    }

    /// The variable name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerKey {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for LayerKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The mutable layering-variable table.
///
/// Tracks the highest value ever assigned, which is the floor every
/// conflict resolution must clear. Writes republish the shared snapshot;
/// last write wins.
#[derive(Debug, Default)]
pub struct LayerVars {
    table: AHashMap<LayerKey, i32>,
    highest: i32,
    shared: Arc<ArcSwap<AHashMap<LayerKey, i32>>>,
}

impl LayerVars {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a variable.
    #[must_use]
    pub fn get(&self, key: &LayerKey) -> Option<i32> {
        self.table.get(key).copied()
    }

    /// Assign a variable and republish the snapshot.
    pub fn set(&mut self, key: LayerKey, value: i32) {
        self.highest = self.highest.max(value);
        let _ = self.table.insert(key, value);
        self.publish();
    }

    /// Remove a variable. The global highest is not lowered; it is a
    /// high-water mark, not an aggregate.
    pub fn remove(&mut self, key: &LayerKey) -> Option<i32> {
        let prior = self.table.remove(key);
        if prior.is_some() {
            self.publish();
        }
        prior
    }

    /// Highest value ever assigned through this table.
    #[must_use]
    pub fn highest(&self) -> i32 {
        self.highest
    }

    /// Number of variables currently present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate the variables in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&LayerKey, i32)> {
        self.table.iter().map(|(k, v)| (k, *v))
    }

    /// A reader handle over the published snapshot.
    #[must_use]
    pub fn reader(&self) -> LayerVarsReader {
        LayerVarsReader {
            shared: Arc::clone(&self.shared),
        }
    }

    fn publish(&self) {
        self.shared.store(Arc::new(self.table.clone()));
    }
}

/// Borrow-free read access to the published layering-variable snapshot.
///
/// Cheap to clone and hand to widget code; reads always see the table as of
/// the engine's most recent write.
#[derive(Debug, Clone)]
pub struct LayerVarsReader {
    shared: Arc<ArcSwap<AHashMap<LayerKey, i32>>>,
}

impl LayerVarsReader {
    /// Read a variable from the current snapshot.
    #[must_use]
    pub fn get(&self, key: &LayerKey) -> Option<i32> {
        self.shared.load().get(key).copied()
    }

    /// The full current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AHashMap<LayerKey, i32>> {
        self.shared.load_full()
    }
}

/// Association from watched nodes to the variable each one writes.
///
/// Owned by the engine coordinator; the detector consults it when landing
/// resolutions.
#[derive(Debug, Default)]
pub struct LayerBindings {
    map: AHashMap<NodeId, LayerKey>,
}

impl LayerBindings {
    /// Create an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a node to a variable, replacing any prior binding.
    pub fn bind(&mut self, id: NodeId, key: LayerKey) {
        let _ = self.map.insert(id, key);
    }

    /// Remove a node's binding.
    pub fn unbind(&mut self, id: NodeId) -> Option<LayerKey> {
        self.map.remove(&id)
    }

    /// Look up a node's variable.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&LayerKey> {
        self.map.get(&id)
    }

    /// Number of bound nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no nodes are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
