//! Concurrent health-check aggregation

use crate::status::HealthStatus;
use crate::unit::HealthCheckUnit;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Detail reported for a unit that did not answer within the probe timeout
pub const TIMEOUT_DETAIL: &str = "timeout";

/// Composes any number of [`HealthCheckUnit`]s into one status.
///
/// Every unit is probed on its own task with a bounded wait, so a hung
/// dependency check degrades the status instead of wedging the endpoint.
/// `aggregate` only reads the unit list and is safe to call from several
/// pollers at once; `register` takes the write lock and is visible to the
/// next aggregation.
pub struct HealthAggregator {
    units: RwLock<Vec<Arc<dyn HealthCheckUnit>>>,
    timeout: Duration,
}

impl Default for HealthAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthAggregator {
    /// Per-unit probe timeout used by [`HealthAggregator::new`]
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Creates an aggregator with the default probe timeout
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Creates an aggregator with a custom probe timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            units: RwLock::new(Vec::new()),
            timeout,
        }
    }

    /// Registers a unit
    pub async fn register(&self, unit: impl HealthCheckUnit + 'static) {
        self.register_shared(Arc::new(unit)).await;
    }

    /// Registers a unit that is also held elsewhere
    pub async fn register_shared(&self, unit: Arc<dyn HealthCheckUnit>) {
        debug!(unit = unit.name(), "Registered health check unit");
        self.units.write().await.push(unit);
    }

    /// Returns the number of registered units
    pub async fn unit_count(&self) -> usize {
        self.units.read().await.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes every unit concurrently and folds the results.
    ///
    /// Healthy only if every unit is healthy; with no units the result is
    /// trivially healthy. Failing details are joined with `"; "`.
    pub async fn aggregate(&self) -> HealthStatus {
        // Snapshot so a concurrent register never waits on slow probes.
        let units: Vec<Arc<dyn HealthCheckUnit>> = self.units.read().await.clone();

        if units.is_empty() {
            return HealthStatus::healthy();
        }

        let limit = self.timeout;
        let probes = units.into_iter().map(|unit| probe_bounded(unit, limit));
        let results = join_all(probes).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter(|(_, status)| !status.healthy)
            .map(|(name, status)| {
                status
                    .detail
                    .filter(|detail| !detail.is_empty())
                    .unwrap_or_else(|| format!("{} unhealthy", name))
            })
            .collect();

        if failures.is_empty() {
            HealthStatus::healthy()
        } else {
            HealthStatus::unhealthy(failures.join("; "))
        }
    }
}

async fn probe_bounded(unit: Arc<dyn HealthCheckUnit>, limit: Duration) -> (String, HealthStatus) {
    let name = unit.name().to_string();
    let task = tokio::spawn(async move { unit.probe().await });
    let abort = task.abort_handle();

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(status)) => (name, status),
        Ok(Err(e)) => {
            warn!(unit = %name, error = %e, "Health check unit panicked");
            let detail = format!("{} panicked", name);
            (name, HealthStatus::unhealthy(detail))
        }
        Err(_) => {
            abort.abort();
            warn!(unit = %name, timeout_ms = limit.as_millis() as u64, "Health check unit timed out");
            (name, HealthStatus::unhealthy(TIMEOUT_DETAIL))
        }
    }
}

/// The aggregate is itself a probe, which is what the registrar hands to
/// the discovery backend.
#[async_trait]
impl HealthCheckUnit for HealthAggregator {
    fn name(&self) -> &str {
        "aggregate"
    }

    async fn probe(&self) -> HealthStatus {
        self.aggregate().await
    }
}
