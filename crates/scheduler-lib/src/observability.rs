//! Observability infrastructure for the preemption scheduler
//!
//! Provides:
//! - Prometheus metrics (cycle latency, candidates, skipped nodes, malformed
//!   entries, selected winners, node-update failures)
//! - Structured JSON logging with tracing

use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for cycle latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SchedulerMetricsInner> = OnceLock::new();

struct SchedulerMetricsInner {
    cycle_latency_seconds: Histogram,
    cycles_total: IntCounter,
    candidates_emitted_total: IntCounter,
    nodes_skipped_total: IntCounter,
    malformed_entries_total: IntCounter,
    winners_selected_total: IntCounter,
    node_update_failures_total: IntCounter,
}

impl SchedulerMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "preempt_scheduler_cycle_latency_seconds",
                "Time spent enumerating and ranking preemption candidates",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            cycles_total: register_int_counter!(
                "preempt_scheduler_cycles_total",
                "Total number of scheduling cycles started"
            )
            .expect("Failed to register cycles_total"),

            candidates_emitted_total: register_int_counter!(
                "preempt_scheduler_candidates_emitted_total",
                "Total number of preemption candidates emitted"
            )
            .expect("Failed to register candidates_emitted_total"),

            nodes_skipped_total: register_int_counter!(
                "preempt_scheduler_nodes_skipped_total",
                "Nodes rejected by constraint or feasibility probing"
            )
            .expect("Failed to register nodes_skipped_total"),

            malformed_entries_total: register_int_counter!(
                "preempt_scheduler_malformed_entries_total",
                "Snapshot entries skipped because they were malformed"
            )
            .expect("Failed to register malformed_entries_total"),

            winners_selected_total: register_int_counter!(
                "preempt_scheduler_winners_selected_total",
                "Candidates promoted to Selected"
            )
            .expect("Failed to register winners_selected_total"),

            node_update_failures_total: register_int_counter!(
                "preempt_scheduler_node_update_failures_total",
                "Failed writes through the node-updater boundary"
            )
            .expect("Failed to register node_update_failures_total"),
        }
    }
}

/// Scheduler metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct SchedulerMetrics {
    _private: (),
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SchedulerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles_total.inc();
    }

    pub fn add_candidates_emitted(&self, count: u64) {
        self.inner().candidates_emitted_total.inc_by(count);
    }

    pub fn inc_nodes_skipped(&self) {
        self.inner().nodes_skipped_total.inc();
    }

    pub fn inc_malformed_entries(&self) {
        self.inner().malformed_entries_total.inc();
    }

    pub fn inc_winners_selected(&self) {
        self.inner().winners_selected_total.inc();
    }

    pub fn inc_node_update_failures(&self) {
        self.inner().node_update_failures_total.inc();
    }
}

/// Structured logger for scheduler events
///
/// Provides consistent JSON-formatted logging for cycle outcomes and
/// boundary failures.
#[derive(Clone)]
pub struct CycleLogger {
    scheduler_name: String,
}

impl CycleLogger {
    pub fn new(scheduler_name: impl Into<String>) -> Self {
        Self {
            scheduler_name: scheduler_name.into(),
        }
    }

    pub fn log_cycle_complete(&self, preemptor: &str, candidates: usize, duration_us: u64) {
        info!(
            event = "cycle_complete",
            scheduler = %self.scheduler_name,
            preemptor = %preemptor,
            candidates = candidates,
            duration_us = duration_us,
            "Scheduling cycle complete"
        );
    }

    pub fn log_winner(&self, preemptor: &str, node: &str, victims: usize, pdb_violations: u32) {
        info!(
            event = "candidate_selected",
            scheduler = %self.scheduler_name,
            preemptor = %preemptor,
            node = %node,
            victims = victims,
            pdb_violations = pdb_violations,
            "Selected preemption candidate"
        );
    }

    pub fn log_no_progress(&self, preemptor: &str) {
        info!(
            event = "no_progress",
            scheduler = %self.scheduler_name,
            preemptor = %preemptor,
            "No node admits the preemptor this cycle"
        );
    }

    pub fn log_update_failure(&self, node: &str, error: &str, retriable: bool) {
        warn!(
            event = "node_update_failed",
            scheduler = %self.scheduler_name,
            node = %node,
            error = %error,
            retriable = retriable,
            "Node update failed"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "scheduler_started",
            scheduler = %self.scheduler_name,
            version = %version,
            "Preemption scheduler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scheduler_shutdown",
            scheduler = %self.scheduler_name,
            reason = %reason,
            "Preemption scheduler shutting down"
        );
    }
}
