#![forbid(unsafe_code)]

//! Conflict result types.

use serde::Serialize;
use stratum_core::node::NodeId;
use web_time::Instant;

/// One candidate overlapping a subject with ambiguous paint order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conflict {
    /// The elevated subject whose paint order is at risk.
    pub subject: NodeId,
    /// The overlapping candidate.
    pub candidate: NodeId,
    /// The candidate's layering value at detection time.
    pub candidate_layer: i32,
    /// Fraction of the subject's area the candidate covers, in `(0, 1]`.
    pub overlap: f64,
}

impl Conflict {
    /// The qualification rule: spatial overlap plus an equal-or-higher
    /// candidate layer. Equal layers count: identical values leave paint
    /// order ambiguous, which is exactly the condition being detected.
    #[inline]
    #[must_use]
    pub fn qualifies(overlap: f64, candidate_layer: i32, subject_layer: i32) -> bool {
        overlap > 0.0 && candidate_layer >= subject_layer
    }
}

/// All conflicts against one subject, from one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictGroup {
    /// The subject.
    pub subject: NodeId,
    /// The subject's layering value at detection time.
    pub subject_layer: i32,
    /// Qualifying conflicts, in active-set (id) order.
    pub conflicts: Vec<Conflict>,
    /// When the cycle ran.
    #[serde(skip)]
    pub detected_at: Instant,
}

impl ConflictGroup {
    /// Highest layering value among the conflicting candidates.
    ///
    /// Groups are only ever built non-empty, so a default of the subject's
    /// own layer is never observable in practice.
    #[must_use]
    pub fn max_candidate_layer(&self) -> i32 {
        self.conflicts
            .iter()
            .map(|c| c.candidate_layer)
            .max()
            .unwrap_or(self.subject_layer)
    }
}
