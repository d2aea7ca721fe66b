//! Scheduler library for preemption-based workload placement
//!
//! This crate provides the core functionality for:
//! - Preemption candidate selection and victim enumeration
//! - Application metric records and their canonical codec
//! - The node-updater capability boundary
//! - Health checks and observability

pub mod appmetric;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod preemption;
pub mod snapshot;
pub mod updater;

pub use appmetric::{AppMetric, DecodeMode, MetricError};
pub use error::SchedulingError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{CycleLogger, SchedulerMetrics};
pub use preemption::{
    take_winner, CancelToken, Candidate, CandidateState, CycleContext, PdbRespect,
    PreemptionEngine, PreemptionPolicy, Victim, Victims,
};
pub use snapshot::{ClusterSnapshot, NodeInfo, SnapshotSource, StaticSnapshotSource};
pub use updater::{InMemoryNodeUpdater, NodeUpdater, TrackedNodeUpdater, UpdateError};
