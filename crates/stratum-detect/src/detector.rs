#![forbid(unsafe_code)]

//! The conflict detector.
//!
//! # Caching
//!
//! Detection results are cached for a short TTL, keyed by the active set's
//! membership signature. Within the TTL, repeated queries for the same
//! membership return the identical shared result (`Arc` pointer equality),
//! which is what makes high-frequency scroll re-detection cheap. Any
//! membership change produces a different signature and misses naturally;
//! geometry-only changes are handled by the short TTL and by explicit
//! invalidation on full re-evaluation.
//!
//! # Resolution
//!
//! Each conflict group lifts its subject to
//! `max(max_candidate + step, global_highest + step)`: strictly above
//! every conflicting candidate and strictly above anything assigned
//! before. Subjects are re-validated against the host tree first, so a
//! stale cycle landing after a node was removed is a no-op.

use std::sync::Arc;
use std::time::Duration;

use stratum_core::active::ActiveSet;
use stratum_core::host::HostTree;
use stratum_core::vars::{LayerBindings, LayerVars};
use stratum_sched::{CacheStats, TtlCache};
use web_time::Instant;

use crate::conflict::{Conflict, ConflictGroup};
use crate::history::{DEFAULT_HISTORY_CAP, ResolutionLog, ResolutionRecord};

/// Configuration for the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// How long a detection result stays valid for an unchanged active set.
    pub cache_ttl: Duration,
    /// Maximum cached active-set signatures.
    pub cache_capacity: usize,
    /// How far above the conflict floor assignments land.
    pub escalation_step: i32,
    /// Capacity of the resolution-history ring.
    pub history_cap: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_millis(100),
            cache_capacity: 8,
            escalation_step: 100,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

impl DetectorConfig {
    /// Set the result TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the escalation step.
    #[must_use]
    pub fn with_escalation_step(mut self, step: i32) -> Self {
        self.escalation_step = step;
        self
    }

    /// Set the history capacity.
    #[must_use]
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }
}

/// Diagnostic counters.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorStats {
    /// Result-cache counters.
    pub cache: CacheStats,
    /// Full (uncached) detection computations.
    pub detections: u64,
    /// Resolutions landed.
    pub resolutions: u64,
    /// Resolutions skipped because the subject had left the tree.
    pub stale_skips: u64,
}

/// Computes and resolves layering conflicts.
#[derive(Debug)]
pub struct Detector {
    config: DetectorConfig,
    cache: TtlCache<u64, Arc<[ConflictGroup]>>,
    history: ResolutionLog,
    detections: u64,
    resolutions: u64,
    stale_skips: u64,
}

impl Detector {
    /// Create a detector with the given configuration.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        let cache = TtlCache::new(config.cache_ttl, config.cache_capacity);
        let history = ResolutionLog::new(config.history_cap);
        Self {
            config,
            cache,
            history,
            detections: 0,
            resolutions: 0,
            stale_skips: 0,
        }
    }

    /// Detect conflicts for the given active-set snapshot.
    ///
    /// Pure for a fixed snapshot: two calls within the TTL return the
    /// identical cached result object. Every active subject (the elevated
    /// role) is tested against every other active candidate; a candidate
    /// qualifies when it spatially overlaps the subject and sits at an
    /// equal-or-higher layer.
    pub fn detect(&mut self, active: &ActiveSet, now: Instant) -> Arc<[ConflictGroup]> {
        let signature = active.signature();
        if let Some(cached) = self.cache.get(&signature, now) {
            return Arc::clone(cached);
        }

        let mut groups = Vec::new();
        for subject in active.iter().filter(|n| n.role.is_subject()) {
            // A zero-area subject can't be overlapped.
            if subject.rect.is_empty() {
                continue;
            }
            let conflicts: Vec<Conflict> = active
                .iter()
                .filter(|candidate| candidate.id != subject.id)
                .filter_map(|candidate| {
                    let overlap = subject.rect.overlap_fraction(&candidate.rect);
                    Conflict::qualifies(overlap, candidate.layer, subject.layer).then_some(
                        Conflict {
                            subject: subject.id,
                            candidate: candidate.id,
                            candidate_layer: candidate.layer,
                            overlap,
                        },
                    )
                })
                .collect();
            if !conflicts.is_empty() {
                groups.push(ConflictGroup {
                    subject: subject.id,
                    subject_layer: subject.layer,
                    conflicts,
                    detected_at: now,
                });
            }
        }

        self.detections += 1;
        tracing::trace!(
            active = active.len(),
            groups = groups.len(),
            "detection cycle computed"
        );
        let result: Arc<[ConflictGroup]> = groups.into();
        self.cache.set(signature, Arc::clone(&result), now);
        result
    }

    /// Resolve conflict groups into new layering assignments.
    ///
    /// Groups are processed in the order given (the detector emits them in
    /// active-set order, which fixes resolution order within a cycle).
    /// Later cycles simply overwrite earlier assignments for the same
    /// variable. Returns the records landed this cycle; the same records
    /// are appended to the bounded history.
    pub fn resolve(
        &mut self,
        tree: &dyn HostTree,
        groups: &[ConflictGroup],
        bindings: &LayerBindings,
        vars: &mut LayerVars,
        now: Instant,
    ) -> Vec<ResolutionRecord> {
        let mut landed = Vec::new();
        for group in groups {
            // A timer may fire after the subject closed or left the tree;
            // re-validate liveness so stale work is a no-op.
            if !tree.is_attached(group.subject) {
                self.stale_skips += 1;
                tracing::debug!(subject = %group.subject, "skipping resolution: subject detached");
                continue;
            }
            let Some(key) = bindings.get(group.subject) else {
                tracing::debug!(subject = %group.subject, "skipping resolution: no bound variable");
                continue;
            };

            let prior_layer = vars.get(key).unwrap_or(group.subject_layer);
            if prior_layer > group.max_candidate_layer() {
                // The group was computed from a snapshot taken before an
                // earlier assignment landed. The subject already paints
                // above every candidate here, so there is nothing left to
                // resolve until new overlap appears.
                tracing::trace!(subject = %group.subject, "already above candidates; no reassignment");
                continue;
            }
            let step = self.config.escalation_step;
            let assigned_layer = (group.max_candidate_layer() + step).max(vars.highest() + step);

            vars.set(key.clone(), assigned_layer);
            let record = ResolutionRecord {
                subject: group.subject,
                key: key.clone(),
                prior_layer,
                assigned_layer,
                at: now,
            };
            tracing::debug!(
                subject = %group.subject,
                key = %record.key,
                prior = prior_layer,
                assigned = assigned_layer,
                "conflict resolved"
            );
            self.history.push(record.clone());
            self.resolutions += 1;
            landed.push(record);
        }
        landed
    }

    /// Drop all cached detection results (full re-evaluation path).
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// The resolution history ring.
    #[must_use]
    pub fn history(&self) -> &ResolutionLog {
        &self.history
    }

    /// Diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            cache: self.cache.stats(),
            detections: self.detections,
            resolutions: self.resolutions,
            stale_skips: self.stale_skips,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
