//! Core data models for the preemption scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource vector used for both workload requests and node capacity.
///
/// CPU is tracked in millicores, memory and ephemeral storage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub milli_cpu: i64,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub ephemeral_storage: i64,
}

/// The dimensions of a [`Resource`] vector, in canonical comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDimension {
    MilliCpu,
    Memory,
    EphemeralStorage,
}

/// Canonical dimension order: ties in bottleneck selection resolve to the
/// earliest entry.
pub const DIMENSIONS: [ResourceDimension; 3] = [
    ResourceDimension::MilliCpu,
    ResourceDimension::Memory,
    ResourceDimension::EphemeralStorage,
];

impl Resource {
    pub const ZERO: Resource = Resource {
        milli_cpu: 0,
        memory: 0,
        ephemeral_storage: 0,
    };

    pub fn new(milli_cpu: i64, memory: i64) -> Self {
        Self {
            milli_cpu,
            memory,
            ephemeral_storage: 0,
        }
    }

    pub fn dimension(&self, dim: ResourceDimension) -> i64 {
        match dim {
            ResourceDimension::MilliCpu => self.milli_cpu,
            ResourceDimension::Memory => self.memory,
            ResourceDimension::EphemeralStorage => self.ephemeral_storage,
        }
    }

    pub fn add(&self, other: &Resource) -> Resource {
        Resource {
            milli_cpu: self.milli_cpu.saturating_add(other.milli_cpu),
            memory: self.memory.saturating_add(other.memory),
            ephemeral_storage: self.ephemeral_storage.saturating_add(other.ephemeral_storage),
        }
    }

    /// Subtraction clamped at zero per dimension.
    pub fn saturating_sub(&self, other: &Resource) -> Resource {
        Resource {
            milli_cpu: (self.milli_cpu - other.milli_cpu).max(0),
            memory: (self.memory - other.memory).max(0),
            ephemeral_storage: (self.ephemeral_storage - other.ephemeral_storage).max(0),
        }
    }

    /// Whether this request fits within `capacity` on every dimension.
    pub fn fits_within(&self, capacity: &Resource) -> bool {
        DIMENSIONS
            .iter()
            .all(|&d| self.dimension(d) <= capacity.dimension(d))
    }

    /// A well-formed vector has no negative dimension.
    pub fn is_valid(&self) -> bool {
        DIMENSIONS.iter().all(|&d| self.dimension(d) >= 0)
    }

    /// The dimension of this request with the largest deficit relative to
    /// `free`, used to order victims by footprint where it matters most.
    ///
    /// Deficits are normalized by the requested amount so that millicores and
    /// bytes compare meaningfully. Ties resolve in canonical dimension order.
    pub fn bottleneck_against(&self, free: &Resource) -> ResourceDimension {
        let mut best = DIMENSIONS[0];
        let mut best_ratio = f64::MIN;
        for &dim in &DIMENSIONS {
            let requested = self.dimension(dim);
            if requested <= 0 {
                continue;
            }
            let deficit = requested - free.dimension(dim);
            let ratio = deficit as f64 / requested as f64;
            if ratio > best_ratio {
                best_ratio = ratio;
                best = dim;
            }
        }
        best
    }
}

/// Node taint effects. `PreferNoSchedule` never blocks placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

/// A taint on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TolerationOperator {
    Exists,
    Equal,
}

/// A workload's toleration of node taints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    #[serde(default)]
    pub key: String,
    pub operator: TolerationOperator,
    #[serde(default)]
    pub value: String,
    /// `None` matches all effects.
    #[serde(default)]
    pub effect: Option<TaintEffect>,
}

impl Toleration {
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = self.effect {
            if effect != taint.effect {
                return false;
            }
        }
        // An empty key with Exists tolerates every taint.
        if self.key.is_empty() {
            return self.operator == TolerationOperator::Exists;
        }
        if self.key != taint.key {
            return false;
        }
        match self.operator {
            TolerationOperator::Exists => true,
            TolerationOperator::Equal => self.value == taint.value,
        }
    }
}

/// Whether every blocking taint is tolerated. `PreferNoSchedule` taints are
/// soft and never block.
pub fn tolerates_all(tolerations: &[Toleration], taints: &[Taint]) -> bool {
    taints
        .iter()
        .filter(|t| t.effect != TaintEffect::PreferNoSchedule)
        .all(|taint| tolerations.iter().any(|tol| tol.tolerates(taint)))
}

/// An exact-match label selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new(match_labels: BTreeMap<String, String>) -> Self {
        Self { match_labels }
    }

    /// True when every selector entry is present in `labels` with the same
    /// value. An empty selector matches nothing.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        if self.match_labels.is_empty() {
            return false;
        }
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
    }
}

/// A cluster-wide disruption budget for a group of workloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisruptionBudget {
    pub group: String,
    /// Minimum number of group members that must keep running.
    pub min_available: u32,
}

/// A pending or running workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub priority: i32,
    pub request: Resource,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    /// Node-affinity selector over node labels.
    #[serde(default)]
    pub affinity: Option<LabelSelector>,
    /// Anti-affinity selector over co-resident workload labels.
    #[serde(default)]
    pub anti_affinity: Option<LabelSelector>,
    /// Disruption-budget group this workload belongs to, if any.
    #[serde(default)]
    pub pdb_group: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Workload {
    pub fn new(id: impl Into<String>, priority: i32, request: Resource) -> Self {
        Self {
            id: id.into(),
            priority,
            request,
            labels: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            tolerations: Vec::new(),
            affinity: None,
            anti_affinity: None,
            pdb_group: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_node_selector(mut self, selector: BTreeMap<String, String>) -> Self {
        self.node_selector = selector;
        self
    }

    pub fn with_tolerations(mut self, tolerations: Vec<Toleration>) -> Self {
        self.tolerations = tolerations;
        self
    }

    pub fn with_affinity(mut self, selector: LabelSelector) -> Self {
        self.affinity = Some(selector);
        self
    }

    pub fn with_anti_affinity(mut self, selector: LabelSelector) -> Self {
        self.anti_affinity = Some(selector);
        self
    }

    pub fn with_pdb_group(mut self, group: impl Into<String>) -> Self {
        self.pdb_group = Some(group.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// A well-formed snapshot entry has an id and a non-negative request.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && self.request.is_valid()
    }
}

/// Post-decision node record persisted through the node-updater boundary.
///
/// Distinct from the snapshot view: this is what the actuator writes back
/// after a scheduling decision lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub allocatable: Resource,
    pub allocated: Resource,
    pub running_workloads: u32,
    /// Monotonically increasing version; stale writes are rejected.
    pub resource_version: u64,
    pub updated_at: i64,
}

impl NodeRecord {
    pub fn new(allocatable: Resource, allocated: Resource, running_workloads: u32) -> Self {
        Self {
            allocatable,
            allocated,
            running_workloads,
            resource_version: 0,
            updated_at: Utc::now().timestamp(),
        }
    }

    pub fn with_resource_version(mut self, version: u64) -> Self {
        self.resource_version = version;
        self
    }
}
