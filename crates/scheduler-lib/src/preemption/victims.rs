//! Per-node feasibility probing and minimal victim-set selection

use super::candidate::{Victim, Victims};
use super::PreemptionPolicy;
use crate::models::{tolerates_all, Resource, ResourceDimension, Workload};
use crate::observability::SchedulerMetrics;
use crate::snapshot::{ClusterSnapshot, NodeInfo};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

/// Evaluate one node for the preemptor. Returns the victim set that admits
/// it, or `None` when the node cannot help (never a scheduling error).
pub(super) fn evaluate_node(
    preemptor: &Workload,
    node: &NodeInfo,
    snapshot: &ClusterSnapshot,
    policy: &PreemptionPolicy,
    metrics: &SchedulerMetrics,
) -> Option<Victims> {
    // Fast reject on static constraints.
    if node.unschedulable {
        return None;
    }
    if !selector_matches(&preemptor.node_selector, &node.labels) {
        return None;
    }
    if let Some(affinity) = &preemptor.affinity {
        if !affinity.matches(&node.labels) {
            return None;
        }
    }
    if !tolerates_all(&preemptor.tolerations, &node.taints) {
        return None;
    }
    if !preemptor.request.fits_within(&node.allocatable) {
        return None;
    }

    let mut used = Resource::ZERO;
    let mut forced: Vec<&Workload> = Vec::new();
    let mut optional: Vec<&Workload> = Vec::new();
    for workload in &node.workloads {
        if !workload.is_well_formed() {
            warn!(
                node = %node.name,
                workload = %workload.id,
                "Skipping malformed snapshot entry"
            );
            metrics.inc_malformed_entries();
            continue;
        }
        used = used.add(&workload.request);
        let anti_match = anti_affinity_matches(preemptor, workload);
        if workload.priority < preemptor.priority {
            // Workloads the preemptor cannot co-exist with must go
            // regardless of capacity.
            if anti_match {
                forced.push(workload);
            } else {
                optional.push(workload);
            }
        } else if anti_match {
            // An equal-or-higher priority blocker can never be evicted.
            return None;
        }
    }

    let free = node.allocatable.saturating_sub(&used);
    if forced.is_empty() && preemptor.request.fits_within(&free) {
        return Some(Victims::default());
    }

    // Feasibility probe: would evicting every lower-priority resident help?
    let mut reclaimable = free;
    for w in forced.iter().chain(optional.iter()) {
        reclaimable = reclaimable.add(&w.request);
    }
    if !preemptor.request.fits_within(&reclaimable) {
        return None;
    }

    let bottleneck = preemptor.request.bottleneck_against(&free);
    let order = |a: &&Workload, b: &&Workload| {
        victim_order(a, b, bottleneck, policy.victim_priority_epsilon)
    };
    forced.sort_by(order);
    optional.sort_by(order);

    // Greedy pass: forced victims first, then cheapest-to-disturb until the
    // preemptor fits.
    let forced_len = forced.len();
    let mut chosen = forced;
    let mut available = free;
    for w in &chosen {
        available = available.add(&w.request);
    }
    for w in optional {
        if preemptor.request.fits_within(&available) {
            break;
        }
        available = available.add(&w.request);
        chosen.push(w);
    }

    // Reverse pruning: drop any non-forced victim the fit survives without.
    let mut idx = chosen.len();
    while idx > forced_len {
        idx -= 1;
        let without = available.saturating_sub(&chosen[idx].request);
        if preemptor.request.fits_within(&without) {
            available = without;
            chosen.remove(idx);
        }
    }

    let num_pdb_violations = count_pdb_violations(&chosen, snapshot);
    Some(Victims {
        workloads: chosen.iter().map(|w| Victim::from(*w)).collect(),
        num_pdb_violations,
    })
}

/// Node-selector semantics: every selector entry must be present on the node.
fn selector_matches(
    selector: &BTreeMap<String, String>,
    labels: &BTreeMap<String, String>,
) -> bool {
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

fn anti_affinity_matches(preemptor: &Workload, resident: &Workload) -> bool {
    preemptor
        .anti_affinity
        .as_ref()
        .map(|sel| sel.matches(&resident.labels))
        .unwrap_or(false)
}

/// Eviction preference: ascending priority (bucketed by the epsilon margin),
/// then largest footprint on the bottleneck dimension, then newest first,
/// then id for a total order.
fn victim_order(
    a: &Workload,
    b: &Workload,
    bottleneck: ResourceDimension,
    epsilon: i32,
) -> Ordering {
    priority_bucket(a.priority, epsilon)
        .cmp(&priority_bucket(b.priority, epsilon))
        .then_with(|| {
            b.request
                .dimension(bottleneck)
                .cmp(&a.request.dimension(bottleneck))
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Priorities within the epsilon margin land in the same bucket, so the
/// footprint and recency tiebreaks decide between them. Bucketing keeps the
/// relation transitive, which a pairwise `|a - b| <= epsilon` test would not.
fn priority_bucket(priority: i32, epsilon: i32) -> i32 {
    if epsilon <= 0 {
        priority
    } else {
        priority.div_euclid(epsilon + 1)
    }
}

/// Violations per group: victims beyond the group's eviction headroom
/// (running members minus the required minimum), summed across groups.
fn count_pdb_violations(chosen: &[&Workload], snapshot: &ClusterSnapshot) -> u32 {
    let mut evicted: BTreeMap<&str, u32> = BTreeMap::new();
    for w in chosen {
        if let Some(group) = w.pdb_group.as_deref() {
            *evicted.entry(group).or_default() += 1;
        }
    }

    let mut violations = 0;
    for (group, count) in evicted {
        let Some(budget) = snapshot.budget(group) else {
            continue;
        };
        let running = snapshot.running_in_group(group);
        let headroom = running.saturating_sub(budget.min_available);
        violations += count.saturating_sub(headroom);
    }
    violations
}
