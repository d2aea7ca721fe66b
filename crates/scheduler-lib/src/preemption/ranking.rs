//! Candidate ranking
//!
//! Lexicographic preference order, best first:
//! fewer disruption-budget violations, lower maximum victim priority, fewer
//! victims, smaller victim priority sum, more recently created victims, and
//! a lexical node-name tiebreak. The global sort uses the cheap keys plus
//! the name tiebreak; only the shortlist head is re-ranked with the deep
//! keys.

use super::candidate::Candidate;
use super::PreemptionPolicy;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub(super) fn rank(candidates: &mut [Candidate], policy: &PreemptionPolicy) {
    candidates.sort_by(base_order);

    let shortlist = policy.min_candidates_for_tie_break.min(candidates.len());
    if shortlist > 1 {
        candidates[..shortlist].sort_by(full_order);
    }
}

fn max_victim_priority(c: &Candidate) -> i64 {
    // An empty victim set ranks best
    c.victims()
        .max_priority()
        .map(i64::from)
        .unwrap_or(i64::MIN)
}

fn oldest_victim_created(c: &Candidate) -> DateTime<Utc> {
    c.victims()
        .oldest_created_at()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn base_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.victims()
        .num_pdb_violations
        .cmp(&b.victims().num_pdb_violations)
        .then_with(|| max_victim_priority(a).cmp(&max_victim_priority(b)))
        .then_with(|| a.victims().len().cmp(&b.victims().len()))
        .then_with(|| a.name().cmp(b.name()))
}

fn full_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.victims()
        .num_pdb_violations
        .cmp(&b.victims().num_pdb_violations)
        .then_with(|| max_victim_priority(a).cmp(&max_victim_priority(b)))
        .then_with(|| a.victims().len().cmp(&b.victims().len()))
        .then_with(|| a.victims().priority_sum().cmp(&b.victims().priority_sum()))
        // Prefer disturbing newer workloads: later oldest-victim first
        .then_with(|| oldest_victim_created(b).cmp(&oldest_victim_created(a)))
        .then_with(|| a.name().cmp(b.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resource, Workload};
    use crate::preemption::candidate::{Victim, Victims};
    use chrono::TimeZone;

    fn candidate(node: &str, priorities: &[i32], violations: u32) -> Candidate {
        let workloads = priorities
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Victim::from(
                    &Workload::new(format!("{}-{}", node, i), p, Resource::new(100, 0))
                        .with_created_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, i as u32).unwrap()),
                )
            })
            .collect();
        Candidate::proposed(
            node.to_string(),
            Victims {
                workloads,
                num_pdb_violations: violations,
            },
        )
    }

    #[test]
    fn test_fewer_violations_rank_first() {
        let mut candidates = vec![
            candidate("node-a", &[1], 1),
            candidate("node-b", &[5, 5], 0),
        ];
        rank(&mut candidates, &PreemptionPolicy::default());
        assert_eq!(candidates[0].name(), "node-b");
    }

    #[test]
    fn test_lower_max_priority_beats_fewer_victims() {
        let mut candidates = vec![
            candidate("node-a", &[8], 0),
            candidate("node-b", &[2, 2, 2], 0),
        ];
        rank(&mut candidates, &PreemptionPolicy::default());
        assert_eq!(candidates[0].name(), "node-b");
    }

    #[test]
    fn test_empty_victims_rank_best() {
        let mut candidates = vec![
            candidate("node-a", &[1], 0),
            candidate("node-b", &[], 0),
        ];
        rank(&mut candidates, &PreemptionPolicy::default());
        assert_eq!(candidates[0].name(), "node-b");
    }

    #[test]
    fn test_priority_sum_breaks_ties_in_shortlist() {
        // Same max priority and count; sums differ
        let mut candidates = vec![
            candidate("node-a", &[5, 4], 0),
            candidate("node-b", &[5, 1], 0),
        ];
        rank(&mut candidates, &PreemptionPolicy::default());
        assert_eq!(candidates[0].name(), "node-b");
    }

    #[test]
    fn test_name_tiebreak_is_lexical() {
        let mut candidates = vec![
            candidate("node-b", &[3], 0),
            candidate("node-a", &[3], 0),
        ];
        rank(&mut candidates, &PreemptionPolicy::default());
        assert_eq!(candidates[0].name(), "node-a");
        assert_eq!(candidates[1].name(), "node-b");
    }

    #[test]
    fn test_deep_keys_ignored_outside_shortlist() {
        let policy = PreemptionPolicy {
            min_candidates_for_tie_break: 0,
            ..PreemptionPolicy::default()
        };
        // Without the shortlist re-rank the priority-sum key never applies,
        // so the lexical name tiebreak decides
        let mut candidates = vec![
            candidate("node-b", &[5, 1], 0),
            candidate("node-a", &[5, 4], 0),
        ];
        rank(&mut candidates, &policy);
        assert_eq!(candidates[0].name(), "node-a");
    }
}
