//! Health-check units
//!
//! A unit is one independent readiness probe, typically checking a single
//! dependency. Units are composed by [`HealthAggregator`](crate::HealthAggregator).

use crate::status::HealthStatus;
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// A pluggable health probe.
///
/// ## Example
///
/// ```rust
/// use beacon_health::{HealthCheckUnit, HealthStatus};
/// use async_trait::async_trait;
///
/// struct CacheCheck;
///
/// #[async_trait]
/// impl HealthCheckUnit for CacheCheck {
///     fn name(&self) -> &str {
///         "cache"
///     }
///
///     async fn probe(&self) -> HealthStatus {
///         // ping the cache here
///         HealthStatus::healthy()
///     }
/// }
/// ```
#[async_trait]
pub trait HealthCheckUnit: Send + Sync {
    /// Name used in logs and in failure details
    fn name(&self) -> &str;

    /// Performs the check. May suspend on I/O.
    async fn probe(&self) -> HealthStatus;
}

#[async_trait]
impl<T: HealthCheckUnit + ?Sized> HealthCheckUnit for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn probe(&self) -> HealthStatus {
        (**self).probe().await
    }
}

/// Reports unhealthy once closed.
///
/// Closed at shutdown so pollers stop routing traffic before the
/// registration is removed.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    open: Arc<AtomicBool>,
}

impl ReadinessGate {
    /// Creates an open gate
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Marks the instance as draining
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!("Readiness gate closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthCheckUnit for ReadinessGate {
    fn name(&self) -> &str {
        "readiness"
    }

    async fn probe(&self) -> HealthStatus {
        if self.is_open() {
            HealthStatus::healthy()
        } else {
            HealthStatus::unhealthy("draining")
        }
    }
}

/// Checks a downstream dependency over HTTP; healthy on any 2xx answer.
#[derive(Debug, Clone)]
pub struct HttpDependencyCheck {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpDependencyCheck {
    /// Create a check against `url`
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_client(name, url, reqwest::Client::new())
    }

    /// Create with a preconfigured client (timeouts, TLS)
    pub fn with_client(
        name: impl Into<String>,
        url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl HealthCheckUnit for HttpDependencyCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> HealthStatus {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::healthy(),
            Ok(response) => {
                warn!(
                    check = %self.name,
                    status = response.status().as_u16(),
                    "Dependency answered with unexpected status"
                );
                HealthStatus::unhealthy(format!(
                    "{}: unexpected status {}",
                    self.name,
                    response.status().as_u16()
                ))
            }
            Err(e) => {
                warn!(check = %self.name, error = %e, "Dependency unreachable");
                HealthStatus::unhealthy(format!("{}: {}", self.name, e))
            }
        }
    }
}

type ProbeFn = dyn Fn() -> BoxFuture<'static, HealthStatus> + Send + Sync;

/// Adapts an async closure into a unit
pub struct FnCheck {
    name: String,
    probe: Box<ProbeFn>,
}

impl FnCheck {
    pub fn new<F, Fut>(name: impl Into<String>, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HealthStatus> + Send + 'static,
    {
        Self {
            name: name.into(),
            probe: Box::new(move || probe().boxed()),
        }
    }
}

#[async_trait]
impl HealthCheckUnit for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> HealthStatus {
        (self.probe)().await
    }
}
