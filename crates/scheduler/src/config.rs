//! Scheduler configuration

use anyhow::Result;
use scheduler_lib::{PdbRespect, PreemptionPolicy};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Scheduler daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduler instance name used in structured log events
    #[serde(default = "default_scheduler_name")]
    pub scheduler_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Bound on the candidate list length per cycle
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Shortlist size re-ranked with the deep tiebreak keys
    #[serde(default = "default_min_candidates_for_tie_break")]
    pub min_candidates_for_tie_break: usize,

    /// Disruption-budget handling: "strict" or "best-effort"
    #[serde(default = "default_pdb_respect")]
    pub pdb_respect: String,

    /// Priority margin below which victims are indistinguishable
    #[serde(default)]
    pub victim_priority_epsilon: i32,

    /// Time budget per scheduling cycle in milliseconds
    #[serde(default = "default_cycle_timeout_ms")]
    pub cycle_timeout_ms: u64,
}

fn default_scheduler_name() -> String {
    std::env::var("SCHEDULER_NAME").unwrap_or_else(|_| "preempt-scheduler".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_candidates() -> usize {
    10
}

fn default_min_candidates_for_tie_break() -> usize {
    3
}

fn default_pdb_respect() -> String {
    "best-effort".to_string()
}

fn default_cycle_timeout_ms() -> u64 {
    500
}

impl SchedulerConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCHEDULER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| SchedulerConfig {
            scheduler_name: default_scheduler_name(),
            api_port: default_api_port(),
            max_candidates: default_max_candidates(),
            min_candidates_for_tie_break: default_min_candidates_for_tie_break(),
            pdb_respect: default_pdb_respect(),
            victim_priority_epsilon: 0,
            cycle_timeout_ms: default_cycle_timeout_ms(),
        }))
    }

    /// The engine policy derived from this configuration
    pub fn policy(&self) -> PreemptionPolicy {
        let pdb_respect = match self.pdb_respect.as_str() {
            "strict" => PdbRespect::Strict,
            "best-effort" => PdbRespect::BestEffort,
            other => {
                warn!(value = %other, "Unknown pdb_respect value, falling back to best-effort");
                PdbRespect::BestEffort
            }
        };
        PreemptionPolicy {
            max_candidates: self.max_candidates,
            min_candidates_for_tie_break: self.min_candidates_for_tie_break,
            pdb_respect,
            victim_priority_epsilon: self.victim_priority_epsilon,
        }
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_millis(self.cycle_timeout_ms)
    }
}
