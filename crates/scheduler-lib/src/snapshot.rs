//! Immutable cluster snapshot consumed by the preemption engine
//!
//! A snapshot is a read-only view of nodes and their resident workloads
//! captured at one logical instant, identified by a generation token. The
//! engine never mutates it, so parallel scheduling cycles can share clones
//! freely.

use crate::models::{DisruptionBudget, Resource, Taint, Workload};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot view of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub unschedulable: bool,
    pub allocatable: Resource,
    #[serde(default)]
    pub workloads: Vec<Workload>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, allocatable: Resource) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            taints: Vec::new(),
            unschedulable: false,
            allocatable,
            workloads: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_taints(mut self, taints: Vec<Taint>) -> Self {
        self.taints = taints;
        self
    }

    pub fn unschedulable(mut self) -> Self {
        self.unschedulable = true;
        self
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workloads.push(workload);
        self
    }

    /// Sum of all well-formed resident requests.
    pub fn requested(&self) -> Resource {
        self.workloads
            .iter()
            .filter(|w| w.is_well_formed())
            .fold(Resource::ZERO, |acc, w| acc.add(&w.request))
    }
}

/// A consistent view of cluster state at one logical instant.
///
/// Nodes are keyed by name in a `BTreeMap`, so iteration order is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    generation: u64,
    nodes: BTreeMap<String, NodeInfo>,
    budgets: BTreeMap<String, DisruptionBudget>,
}

impl ClusterSnapshot {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            nodes: BTreeMap::new(),
            budgets: BTreeMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn add_node(&mut self, node: NodeInfo) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn add_budget(&mut self, budget: DisruptionBudget) {
        self.budgets.insert(budget.group.clone(), budget);
    }

    pub fn node(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.get(name)
    }

    /// Nodes in ascending name order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn budget(&self, group: &str) -> Option<&DisruptionBudget> {
        self.budgets.get(group)
    }

    /// Number of well-formed workloads in `group` running anywhere in the
    /// snapshot. Disruption budgets are cluster-wide.
    pub fn running_in_group(&self, group: &str) -> u32 {
        self.nodes
            .values()
            .flat_map(|n| n.workloads.iter())
            .filter(|w| w.is_well_formed() && w.pdb_group.as_deref() == Some(group))
            .count() as u32
    }
}

/// Read-only snapshot provider. The real source lives outside this crate;
/// [`StaticSnapshotSource`] serves tests and local mode.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<ClusterSnapshot>;
}

/// Snapshot source backed by a fixed in-memory snapshot.
#[derive(Debug, Clone)]
pub struct StaticSnapshotSource {
    snapshot: ClusterSnapshot,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn snapshot(&self) -> Result<ClusterSnapshot> {
        Ok(self.snapshot.clone())
    }
}
