#![forbid(unsafe_code)]

//! Watcher: the registry of tracked host-tree nodes.
//!
//! The watcher classifies nodes against the fixed role-marker table, tracks
//! their activation state, and produces the sorted [`ActiveSet`] snapshots
//! the conflict detector consumes. Entries are keyed by [`NodeId`] only;
//! nodes found detached are pruned lazily rather than held alive.
//!
//! [`ActiveSet`]: stratum_core::active::ActiveSet
//! [`NodeId`]: stratum_core::node::NodeId

pub mod watcher;

pub use watcher::{ActivationFlip, MutationOutcome, WatchedNode, Watcher, WatcherConfig};
