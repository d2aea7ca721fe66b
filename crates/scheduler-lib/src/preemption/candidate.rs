//! Candidate value types and their lifecycle
//!
//! A candidate pairs a target node name with the victim set that must be
//! evicted there to admit the preemptor. Candidates hold node names and
//! victim data by value; nothing points back into the snapshot.

use crate::models::Workload;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Value copy of a workload chosen for eviction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Victim {
    pub id: String,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Workload> for Victim {
    fn from(w: &Workload) -> Self {
        Victim {
            id: w.id.clone(),
            priority: w.priority,
            created_at: w.created_at,
        }
    }
}

/// The victim set for one candidate, plus the number of disruption-budget
/// violations its eviction would incur.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Victims {
    pub workloads: Vec<Victim>,
    pub num_pdb_violations: u32,
}

impl Victims {
    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    /// Highest priority among the victims; `None` for an empty set.
    pub fn max_priority(&self) -> Option<i32> {
        self.workloads.iter().map(|v| v.priority).max()
    }

    pub fn priority_sum(&self) -> i64 {
        self.workloads.iter().map(|v| i64::from(v.priority)).sum()
    }

    /// Creation time of the oldest victim; `None` for an empty set.
    pub fn oldest_created_at(&self) -> Option<DateTime<Utc>> {
        self.workloads.iter().map(|v| v.created_at).min()
    }
}

/// Lifecycle of a candidate within one scheduling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateState {
    Proposed,
    Selected,
    Discarded,
}

/// A nominated node together with the victims to evict there.
///
/// Immutable once produced; only the lifecycle state advances, and only by
/// consuming the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    node_name: String,
    victims: Victims,
    state: CandidateState,
}

impl Candidate {
    pub(crate) fn proposed(node_name: String, victims: Victims) -> Self {
        Self {
            node_name,
            victims,
            state: CandidateState::Proposed,
        }
    }

    /// The target node the preemptor gets nominated to run on.
    pub fn name(&self) -> &str {
        &self.node_name
    }

    /// The victim set and its disruption-budget violation count.
    pub fn victims(&self) -> &Victims {
        &self.victims
    }

    pub fn state(&self) -> CandidateState {
        self.state
    }

    pub fn into_selected(mut self) -> Self {
        self.state = CandidateState::Selected;
        self
    }

    pub fn into_discarded(mut self) -> Self {
        self.state = CandidateState::Discarded;
        self
    }
}

/// Mark the best candidate `Selected` and discard the rest.
///
/// The input is expected in preference order, best first, as returned by the
/// engine. Pure state transition; `PreemptionEngine::select_winner` is the
/// recorded variant.
pub fn take_winner(candidates: Vec<Candidate>) -> Option<Candidate> {
    let mut iter = candidates.into_iter();
    let winner = iter.next()?.into_selected();
    for candidate in iter {
        let _ = candidate.into_discarded();
    }
    Some(winner)
}
