//! Node updater capability boundary
//!
//! A single-method, write-only capability for persisting post-decision node
//! state. The real backend lives outside this crate; [`InMemoryNodeUpdater`]
//! is the test double and local-mode implementation.

use crate::models::NodeRecord;
use crate::observability::{CycleLogger, SchedulerMetrics};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure taxonomy of the updater boundary.
///
/// `Transient` failures are retriable with backoff; the retry policy belongs
/// to the caller, never to the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("node {0} not found")]
    NotFound(String),
    #[error("conflict updating node {name}: {reason}")]
    Conflict { name: String, reason: String },
    #[error("transient backend failure: {0}")]
    Transient(String),
    #[error("permanent backend failure: {0}")]
    Permanent(String),
}

impl UpdateError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, UpdateError::Transient(_))
    }
}

/// Write-only capability for persisting a node record.
///
/// The update must be durable from the caller's perspective before the call
/// returns, and repeated calls with identical arguments must converge to the
/// same observable state.
#[async_trait]
pub trait NodeUpdater: Send + Sync {
    async fn update_node(&self, name: &str, record: &NodeRecord) -> Result<(), UpdateError>;
}

/// In-memory node updater.
///
/// Only nodes registered up front are updatable; anything else is
/// `NotFound`. A record with a lower `resource_version` than the stored one
/// is rejected as `Conflict`.
#[derive(Debug, Default)]
pub struct InMemoryNodeUpdater {
    records: RwLock<HashMap<String, Option<NodeRecord>>>,
}

impl InMemoryNodeUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the node names this updater will accept writes for.
    pub fn with_nodes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = names.into_iter().map(|n| (n.into(), None)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn get(&self, name: &str) -> Option<NodeRecord> {
        self.records.read().await.get(name).cloned().flatten()
    }
}

/// Decorator that counts and logs failed writes before propagating them.
///
/// Retries stay with the caller; this layer only records the outcome.
pub struct TrackedNodeUpdater<U> {
    inner: U,
    metrics: SchedulerMetrics,
    logger: CycleLogger,
}

impl<U: NodeUpdater> TrackedNodeUpdater<U> {
    pub fn new(inner: U, metrics: SchedulerMetrics, logger: CycleLogger) -> Self {
        Self {
            inner,
            metrics,
            logger,
        }
    }
}

#[async_trait]
impl<U: NodeUpdater> NodeUpdater for TrackedNodeUpdater<U> {
    async fn update_node(&self, name: &str, record: &NodeRecord) -> Result<(), UpdateError> {
        let result = self.inner.update_node(name, record).await;
        if let Err(err) = &result {
            self.metrics.inc_node_update_failures();
            self.logger
                .log_update_failure(name, &err.to_string(), err.is_retriable());
        }
        result
    }
}

#[async_trait]
impl NodeUpdater for InMemoryNodeUpdater {
    async fn update_node(&self, name: &str, record: &NodeRecord) -> Result<(), UpdateError> {
        if name.is_empty() {
            return Err(UpdateError::InvalidArgument(
                "node name is empty".to_string(),
            ));
        }

        let mut records = self.records.write().await;
        let slot = records
            .get_mut(name)
            .ok_or_else(|| UpdateError::NotFound(name.to_string()))?;

        if let Some(existing) = slot {
            if record.resource_version < existing.resource_version {
                return Err(UpdateError::Conflict {
                    name: name.to_string(),
                    reason: format!(
                        "stale resource version {} < {}",
                        record.resource_version, existing.resource_version
                    ),
                });
            }
        }
        *slot = Some(record.clone());
        Ok(())
    }
}
