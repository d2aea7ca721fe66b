//! Error kinds surfaced by the preemption engine
//!
//! Kinds propagate intact to the caller; the engine never retries
//! internally. Malformed per-node snapshot entries are logged and skipped,
//! never escalated, and an empty candidate list is "no progress this cycle",
//! not an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The caller supplied a malformed preemptor; not retriable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's generation precondition no longer matches; retry with a
    /// fresh snapshot.
    #[error("snapshot stale: expected generation {expected}, found {actual}")]
    SnapshotStale { expected: u64, actual: u64 },

    /// The request exceeds every node's empty capacity; eviction cannot
    /// help. Do not retry against the same cluster shape.
    #[error("workload {workload} cannot fit any node even after full eviction")]
    Infeasible { workload: String },

    /// The cycle was cancelled at a quiescent point; partial work discarded.
    #[error("scheduling cycle cancelled")]
    Cancelled,

    /// The cycle exhausted its time budget between node evaluations.
    #[error("scheduling cycle exceeded its time budget")]
    DeadlineExceeded,
}
