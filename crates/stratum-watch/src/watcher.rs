#![forbid(unsafe_code)]

//! Watched-node registry and classification.
//!
//! # State machine
//!
//! Per node: `Unwatched → Watched{inactive} ⇄ Watched{active} → Unwatched`.
//! The transition out happens on explicit [`unwatch`](Watcher::unwatch) or
//! when the node is found detached from the host tree, in which case the
//! entry is pruned on next access, never an error.
//!
//! # Classification retries
//!
//! A mutation batch may announce a node before the host has attached it
//! (portals mount their content a turn late). Such candidates go to a
//! dedup'd retry queue drained once per scheduling tick; a candidate that
//! still isn't attached after the retry budget is silently dropped.

use ahash::AHashMap;
use stratum_core::active::{ActiveNode, ActiveSet};
use stratum_core::host::{AttrChange, HostTree, MutationBatch};
use stratum_core::node::{NodeId, Role};
use stratum_sched::BatchQueue;
use web_time::Instant;

/// Configuration for the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// How many scheduling ticks an unattached candidate is retried before
    /// being dropped.
    pub max_classify_retries: u8,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            max_classify_retries: 3,
        }
    }
}

impl WatcherConfig {
    /// Set the retry budget.
    #[must_use]
    pub fn with_max_classify_retries(mut self, retries: u8) -> Self {
        self.max_classify_retries = retries;
        self
    }
}

/// Registry entry for one watched node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchedNode {
    /// Classified role.
    pub role: Role,
    /// Layering value captured when watching began; restored on close.
    pub original_layer: i32,
    /// Last observed activation state. The predicate itself is always
    /// re-evaluated fresh; this field only exists to detect flips.
    pub is_active: bool,
    /// When activation was last evaluated.
    pub last_checked: Instant,
}

/// An activation-state flip reported from an attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationFlip {
    /// The node whose state flipped.
    pub node: NodeId,
    /// The new activation state.
    pub active: bool,
}

/// What one mutation batch (or retry drain) did to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Nodes newly watched by classification.
    pub watched: Vec<NodeId>,
    /// Entries pruned because their node left the tree.
    pub pruned: Vec<NodeId>,
    /// Candidates deferred to the retry queue.
    pub deferred: Vec<NodeId>,
    /// Candidates dropped after exhausting the retry budget.
    pub dropped: Vec<NodeId>,
}

impl MutationOutcome {
    /// Whether the active set may have changed, requiring re-detection.
    #[must_use]
    pub fn requires_detection(&self) -> bool {
        !self.watched.is_empty() || !self.pruned.is_empty()
    }
}

/// The watched-node registry.
///
/// Owned by the engine coordinator; there is no global instance, so any
/// number of independent engines can watch disjoint (or even overlapping)
/// trees.
#[derive(Debug)]
pub struct Watcher {
    config: WatcherConfig,
    registry: AHashMap<NodeId, WatchedNode>,
    retry: BatchQueue<NodeId>,
    attempts: AHashMap<NodeId, u8>,
}

impl Watcher {
    /// Create a watcher with the given configuration.
    #[must_use]
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            registry: AHashMap::new(),
            retry: BatchQueue::new(),
            attempts: AHashMap::new(),
        }
    }

    /// Start watching a node.
    ///
    /// Idempotent: watching an already-watched node leaves the registry
    /// unchanged (the original role and captured layer stay). A detached
    /// node is rejected with a logged no-op. Returns whether the node is
    /// watched after the call.
    pub fn watch(&mut self, tree: &dyn HostTree, id: NodeId, role: Role, now: Instant) -> bool {
        if self.registry.contains_key(&id) {
            tracing::trace!(node = %id, "watch: already registered");
            return true;
        }
        if !tree.is_attached(id) {
            tracing::debug!(node = %id, role = %role, "watch rejected: node detached");
            return false;
        }
        let entry = WatchedNode {
            role,
            original_layer: tree.layer_of(id),
            is_active: role.is_active(tree, id),
            last_checked: now,
        };
        tracing::debug!(node = %id, role = %role, active = entry.is_active, "watching node");
        let _ = self.registry.insert(id, entry);
        true
    }

    /// Stop watching a node, returning its entry so the caller can restore
    /// the original layer. No-op (`None`) if the node wasn't watched.
    pub fn unwatch(&mut self, id: NodeId) -> Option<WatchedNode> {
        let entry = self.registry.remove(&id);
        let _ = self.attempts.remove(&id);
        if entry.is_some() {
            tracing::debug!(node = %id, "unwatched node");
        }
        entry
    }

    /// Whether the node is currently registered.
    #[must_use]
    pub fn is_watched(&self, id: NodeId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Inspect a registry entry.
    #[must_use]
    pub fn watched(&self, id: NodeId) -> Option<&WatchedNode> {
        self.registry.get(&id)
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of candidates waiting in the retry queue.
    #[must_use]
    pub fn pending_retries(&self) -> usize {
        self.retry.len()
    }

    /// Evaluate a node's activation predicate, fresh.
    ///
    /// Never cached: the host may have mutated since the last notification,
    /// and stale activation is exactly the bug class this engine exists to
    /// kill. A node found detached is pruned here and reads inactive.
    pub fn is_active(&mut self, tree: &dyn HostTree, id: NodeId) -> bool {
        let Some(role) = self.registry.get(&id).map(|e| e.role) else {
            return false;
        };
        if !tree.is_attached(id) {
            self.prune(id);
            return false;
        }
        role.is_active(tree, id)
    }

    /// Process one batch of tree mutations atomically.
    ///
    /// Added subtrees are classified recursively against the role-marker
    /// table (a single batch can introduce several matching nodes at once).
    /// Removed subtrees are pruned, as is any registry entry found
    /// detached.
    pub fn on_tree_mutation(
        &mut self,
        tree: &dyn HostTree,
        batch: &MutationBatch,
        now: Instant,
    ) -> MutationOutcome {
        let mut outcome = MutationOutcome::default();

        for &root in &batch.added {
            self.classify_subtree(tree, root, now, &mut outcome);
        }

        for &root in &batch.removed {
            if self.registry.remove(&root).is_some() {
                outcome.pruned.push(root);
            }
        }
        // Removal notifications name subtree roots; sweep the registry for
        // descendants that went with them.
        let detached: Vec<NodeId> = self
            .registry
            .keys()
            .copied()
            .filter(|&id| !tree.is_attached(id))
            .collect();
        for id in detached {
            self.prune(id);
            outcome.pruned.push(id);
        }

        tracing::trace!(
            watched = outcome.watched.len(),
            pruned = outcome.pruned.len(),
            deferred = outcome.deferred.len(),
            "mutation batch processed"
        );
        outcome
    }

    /// Drain the classification retry queue for this scheduling tick.
    pub fn retry_pending(&mut self, tree: &dyn HostTree, now: Instant) -> MutationOutcome {
        let mut outcome = MutationOutcome::default();
        for id in self.retry.take() {
            if self.registry.contains_key(&id) {
                // Watched explicitly in the meantime.
                let _ = self.attempts.remove(&id);
                continue;
            }
            let Some(role) = tree.role_marker(id).and_then(Role::from_marker) else {
                // Marker vanished with the node; nothing left to classify.
                let _ = self.attempts.remove(&id);
                continue;
            };
            if tree.is_attached(id) {
                if self.watch(tree, id, role, now) {
                    outcome.watched.push(id);
                }
                let _ = self.attempts.remove(&id);
                continue;
            }
            let attempts = self.attempts.entry(id).or_insert(0);
            *attempts += 1;
            if *attempts >= self.config.max_classify_retries {
                let _ = self.attempts.remove(&id);
                tracing::debug!(node = %id, "classification timed out; dropping candidate");
                outcome.dropped.push(id);
            } else {
                let _ = self.retry.push(id);
                outcome.deferred.push(id);
            }
        }
        outcome
    }

    /// React to an attribute change on a node.
    ///
    /// Recomputes activation when the changed attributes can affect this
    /// role's predicate; a flip is reported so the coordinator can schedule
    /// re-detection. A detached node is pruned, reporting a deactivation
    /// flip if it was active.
    pub fn on_attribute_change(
        &mut self,
        tree: &dyn HostTree,
        id: NodeId,
        kinds: AttrChange,
        now: Instant,
    ) -> Option<ActivationFlip> {
        let entry = self.registry.get(&id)?;
        let role = entry.role;
        let was_active = entry.is_active;

        if !tree.is_attached(id) {
            self.prune(id);
            return was_active.then_some(ActivationFlip {
                node: id,
                active: false,
            });
        }
        if !kinds.affects_activation(role.activation()) {
            return None;
        }

        let active = role.is_active(tree, id);
        if let Some(entry) = self.registry.get_mut(&id) {
            entry.is_active = active;
            entry.last_checked = now;
        }
        if active == was_active {
            return None;
        }
        tracing::debug!(node = %id, active, "activation flipped");
        Some(ActivationFlip { node: id, active })
    }

    /// Snapshot the active subset of the registry, sorted by node id.
    ///
    /// Predicates are evaluated fresh and detached entries are pruned along
    /// the way; geometry and layering are captured per node as of `now`.
    pub fn active_set(&mut self, tree: &dyn HostTree, now: Instant) -> ActiveSet {
        let mut ids: Vec<NodeId> = self.registry.keys().copied().collect();
        ids.sort_unstable();

        let mut nodes = Vec::new();
        for id in ids {
            let Some(entry) = self.registry.get(&id) else {
                continue;
            };
            let role = entry.role;
            if !tree.is_attached(id) {
                self.prune(id);
                continue;
            }
            let active = role.is_active(tree, id);
            if let Some(entry) = self.registry.get_mut(&id) {
                entry.is_active = active;
                entry.last_checked = now;
            }
            if active {
                nodes.push(ActiveNode {
                    id,
                    role,
                    rect: tree.bounding_rect(id),
                    layer: tree.layer_of(id),
                });
            }
        }
        ActiveSet::new(nodes)
    }

    fn classify_subtree(
        &mut self,
        tree: &dyn HostTree,
        root: NodeId,
        now: Instant,
        outcome: &mut MutationOutcome,
    ) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(role) = tree.role_marker(id).and_then(Role::from_marker) {
                if self.registry.contains_key(&id) {
                    // Already watched (e.g. explicit open preceded the
                    // mutation notification).
                } else if tree.is_attached(id) {
                    if self.watch(tree, id, role, now) {
                        outcome.watched.push(id);
                    }
                } else if self.retry.push(id) {
                    let _ = self.attempts.entry(id).or_insert(0);
                    outcome.deferred.push(id);
                }
            }
            stack.extend(tree.children(id));
        }
    }

    fn prune(&mut self, id: NodeId) {
        if self.registry.remove(&id).is_some() {
            tracing::debug!(node = %id, "pruned detached node");
        }
        let _ = self.attempts.remove(&id);
    }
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new(WatcherConfig::default())
    }
}
