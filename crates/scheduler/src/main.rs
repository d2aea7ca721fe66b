//! Preemption scheduler daemon
//!
//! Hosts the preemption candidate engine together with its health and
//! metrics surface. Snapshot ingestion and eviction actuation attach through
//! the library's capability traits.

use anyhow::Result;
use scheduler_lib::{
    health::{components, HealthRegistry},
    observability::{CycleLogger, SchedulerMetrics},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SCHEDULER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting preempt-scheduler");

    // Load configuration
    let config = config::SchedulerConfig::load()?;
    let policy = config.policy();
    info!(
        scheduler_name = %config.scheduler_name,
        max_candidates = policy.max_candidates,
        pdb_respect = ?policy.pdb_respect,
        cycle_timeout_ms = config.cycle_timeout_ms,
        "Scheduler configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::SNAPSHOT_SOURCE).await;
    health_registry.register(components::NODE_UPDATER).await;

    // Initialize metrics
    let metrics = SchedulerMetrics::new();

    // Initialize structured logger
    let logger = CycleLogger::new(&config.scheduler_name);
    logger.log_startup(SCHEDULER_VERSION);

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics.clone()));

    // Mark scheduler as ready after initialization
    health_registry.set_ready(true).await;

    // Start health and metrics server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
