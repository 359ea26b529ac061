#![forbid(unsafe_code)]

//! Bounded resolution history.

use std::collections::VecDeque;

use serde::Serialize;
use stratum_core::node::NodeId;
use stratum_core::vars::LayerKey;
use web_time::Instant;

/// Default capacity of the resolution ring.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// One landed resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionRecord {
    /// The subject that was reassigned.
    pub subject: NodeId,
    /// The variable that was written.
    pub key: LayerKey,
    /// The subject's effective layer before the assignment.
    pub prior_layer: i32,
    /// The assigned layer.
    pub assigned_layer: i32,
    /// When the resolution landed.
    #[serde(skip)]
    pub at: Instant,
}

/// Ring buffer of recent resolutions for diagnostics.
///
/// Bounded: beyond capacity the oldest record is evicted. The total count
/// keeps running so hosts can tell how much history rolled off.
#[derive(Debug)]
pub struct ResolutionLog {
    records: VecDeque<ResolutionRecord>,
    cap: usize,
    total: u64,
}

impl ResolutionLog {
    /// Create a log with the given capacity (at least 1).
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            records: VecDeque::new(),
            cap: cap.max(1),
            total: 0,
        }
    }

    /// Append a record, evicting the oldest beyond capacity.
    pub fn push(&mut self, record: ResolutionRecord) {
        if self.records.len() == self.cap {
            let _ = self.records.pop_front();
        }
        self.records.push_back(record);
        self.total += 1;
    }

    /// Iterate records oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &ResolutionRecord> {
        self.records.iter()
    }

    /// The most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&ResolutionRecord> {
        self.records.back()
    }

    /// Records currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total records ever pushed, including evicted ones.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Drop all retained records. The total keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for ResolutionLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
