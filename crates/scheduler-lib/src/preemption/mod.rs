//! Preemption candidate engine
//!
//! Given a pending workload, an immutable cluster snapshot, and a policy,
//! enumerate the nodes where evicting lower-priority work would admit it,
//! compute a minimal victim set per node, and rank the results. The engine
//! is synchronous and CPU-bound over in-memory data; it performs no I/O,
//! holds no locks, and is deterministic for fixed inputs.

pub mod candidate;
mod ranking;
mod victims;


pub use candidate::{take_winner, Candidate, CandidateState, Victim, Victims};

use crate::error::SchedulingError;
use crate::models::Workload;
use crate::observability::{CycleLogger, SchedulerMetrics};
use crate::snapshot::ClusterSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// How strictly disruption budgets constrain candidate emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdbRespect {
    /// Suppress violating candidates whenever a violation-free one exists.
    #[serde(rename = "strict")]
    Strict,
    /// Keep violating candidates, ranked worse.
    #[serde(rename = "best-effort")]
    BestEffort,
}

/// Engine configuration for one scheduling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreemptionPolicy {
    /// Bound on the returned list length. Zero yields an empty list.
    pub max_candidates: usize,
    /// Size of the head shortlist re-ranked with the deep tiebreak keys.
    pub min_candidates_for_tie_break: usize,
    pub pdb_respect: PdbRespect,
    /// Priority margin below which lower-priority workloads are
    /// indistinguishable when ordering victims.
    pub victim_priority_epsilon: i32,
}

impl Default for PreemptionPolicy {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            min_candidates_for_tie_break: 3,
            pdb_respect: PdbRespect::BestEffort,
            victim_priority_epsilon: 0,
        }
    }
}

/// Cooperative cancellation handle, checked between node evaluations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Per-cycle caller preconditions and budget.
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    /// Generation the caller captured its snapshot at; a mismatch fails the
    /// cycle with `SnapshotStale` before any node is examined.
    pub expected_generation: Option<u64>,
    /// Time budget, checked at quiescent points between nodes.
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelToken>,
}

impl CycleContext {
    fn check_budget(&self) -> Result<(), SchedulingError> {
        if let Some(cancel) = &self.cancel {
            if cancel.is_cancelled() {
                return Err(SchedulingError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SchedulingError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

/// The candidate selection engine. Holds no mutable state; one instance can
/// serve parallel cycles on separate snapshots.
#[derive(Clone)]
pub struct PreemptionEngine {
    metrics: SchedulerMetrics,
    logger: CycleLogger,
}

impl Default for PreemptionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PreemptionEngine {
    pub fn new() -> Self {
        Self::named("preempt-scheduler")
    }

    /// Engine tagged with a scheduler instance name for its log events.
    pub fn named(scheduler_name: impl Into<String>) -> Self {
        Self {
            metrics: SchedulerMetrics::new(),
            logger: CycleLogger::new(scheduler_name),
        }
    }

    /// Find preemption candidates with default cycle preconditions.
    pub fn find_candidates(
        &self,
        preemptor: &Workload,
        snapshot: &ClusterSnapshot,
        policy: &PreemptionPolicy,
    ) -> Result<Vec<Candidate>, SchedulingError> {
        self.find_candidates_with(&CycleContext::default(), preemptor, snapshot, policy)
    }

    /// Find preemption candidates, in preference order, best first.
    ///
    /// Returns an empty list when no node admits the preemptor even after
    /// evictions ("no progress this cycle", not an error).
    pub fn find_candidates_with(
        &self,
        ctx: &CycleContext,
        preemptor: &Workload,
        snapshot: &ClusterSnapshot,
        policy: &PreemptionPolicy,
    ) -> Result<Vec<Candidate>, SchedulingError> {
        let started = Instant::now();
        validate_preemptor(preemptor)?;

        if let Some(expected) = ctx.expected_generation {
            if snapshot.generation() != expected {
                return Err(SchedulingError::SnapshotStale {
                    expected,
                    actual: snapshot.generation(),
                });
            }
        }

        self.metrics.inc_cycles();

        let mut any_valid_node = false;
        let mut fits_some_empty_node = false;
        let mut candidates = Vec::new();

        for node in snapshot.nodes() {
            ctx.check_budget()?;

            if !node.allocatable.is_valid() {
                warn!(node = %node.name, "Skipping node with malformed allocatable capacity");
                self.metrics.inc_malformed_entries();
                continue;
            }
            any_valid_node = true;
            if preemptor.request.fits_within(&node.allocatable) {
                fits_some_empty_node = true;
            }

            match victims::evaluate_node(preemptor, node, snapshot, policy, &self.metrics) {
                Some(victims) => {
                    candidates.push(Candidate::proposed(node.name.clone(), victims))
                }
                None => self.metrics.inc_nodes_skipped(),
            }
        }

        if any_valid_node && !fits_some_empty_node {
            return Err(SchedulingError::Infeasible {
                workload: preemptor.id.clone(),
            });
        }

        if policy.pdb_respect == PdbRespect::Strict
            && candidates
                .iter()
                .any(|c| c.victims().num_pdb_violations == 0)
        {
            let before = candidates.len();
            candidates.retain(|c| c.victims().num_pdb_violations == 0);
            if candidates.len() < before {
                debug!(
                    suppressed = before - candidates.len(),
                    "Suppressed budget-violating candidates under strict policy"
                );
            }
        }

        ranking::rank(&mut candidates, policy);
        candidates.truncate(policy.max_candidates);

        self.metrics
            .observe_cycle_latency(started.elapsed().as_secs_f64());
        self.metrics.add_candidates_emitted(candidates.len() as u64);

        self.logger.log_cycle_complete(
            &preemptor.id,
            candidates.len(),
            started.elapsed().as_micros() as u64,
        );
        Ok(candidates)
    }

    /// Promote the best candidate to `Selected`, discard the rest, and record
    /// the outcome.
    ///
    /// The list is expected in the preference order `find_candidates`
    /// returned. An empty list logs "no progress" and yields `None`.
    pub fn select_winner(
        &self,
        preemptor: &Workload,
        candidates: Vec<Candidate>,
    ) -> Option<Candidate> {
        match take_winner(candidates) {
            Some(winner) => {
                self.metrics.inc_winners_selected();
                self.logger.log_winner(
                    &preemptor.id,
                    winner.name(),
                    winner.victims().len(),
                    winner.victims().num_pdb_violations,
                );
                Some(winner)
            }
            None => {
                self.logger.log_no_progress(&preemptor.id);
                None
            }
        }
    }
}

fn validate_preemptor(preemptor: &Workload) -> Result<(), SchedulingError> {
    if preemptor.id.is_empty() {
        return Err(SchedulingError::InvalidArgument(
            "preemptor id is empty".to_string(),
        ));
    }
    if preemptor.priority <= 0 {
        return Err(SchedulingError::InvalidArgument(format!(
            "preemptor priority must be strictly positive, got {}",
            preemptor.priority
        )));
    }
    if !preemptor.request.is_valid() {
        return Err(SchedulingError::InvalidArgument(
            "preemptor resource request has a negative dimension".to_string(),
        ));
    }
    Ok(())
}
