//! Startup and shutdown hooks
//!
//! [`ServiceBootstrap`] ties the pieces together for the host application:
//! `on_start` resolves the advertised address once and registers it with the
//! discovery backend, `on_stop` stops reporting ready and withdraws the
//! registration without letting an unreachable backend stall shutdown.

use crate::error::Result;
use beacon_config::BeaconConfig;
use beacon_discovery::{
    ConsulBackend, ConsulCheck, DiscoveryBackend, InMemoryBackend, RegistrationHandle,
    ServiceRegistrar,
};
use beacon_health::{HealthAggregator, HealthCheckUnit, ReadinessGate};
use beacon_resolver::{
    AddressResolver, DeploymentMode, MetadataClient, ServiceAddress, ServiceIdentity,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Lifecycle hooks for a self-registering service
pub struct ServiceBootstrap {
    mode: DeploymentMode,
    resolver: AddressResolver,
    registrar: ServiceRegistrar,
    health: Arc<HealthAggregator>,
    gate: ReadinessGate,
    address: OnceCell<ServiceAddress>,
    deregister_timeout: Duration,
}

impl ServiceBootstrap {
    /// Deregistration wait used by [`ServiceBootstrap::new`]
    pub const DEFAULT_DEREGISTER_TIMEOUT: Duration = Duration::from_secs(5);

    /// Assemble from explicit parts. Registers a readiness gate with `health`.
    pub async fn new(
        mode: DeploymentMode,
        resolver: AddressResolver,
        registrar: ServiceRegistrar,
        health: Arc<HealthAggregator>,
    ) -> Self {
        let gate = ReadinessGate::new();
        health.register(gate.clone()).await;

        Self {
            mode,
            resolver,
            registrar,
            health,
            gate,
            address: OnceCell::new(),
            deregister_timeout: Self::DEFAULT_DEREGISTER_TIMEOUT,
        }
    }

    /// Bound how long `on_stop` waits for the backend
    pub fn with_deregister_timeout(mut self, timeout: Duration) -> Self {
        self.deregister_timeout = timeout;
        self
    }

    /// Assemble from configuration.
    ///
    /// Uses Consul when `consul_host` is set and the in-memory backend
    /// otherwise.
    pub async fn from_config(config: &BeaconConfig) -> Result<Self> {
        let mode = DeploymentMode::from_signal(config.deployment_mode.as_deref());
        let metadata =
            MetadataClient::with_timeout(config.metadata_url.as_str(), config.metadata_timeout())?;
        let resolver = AddressResolver::new(metadata, config.service_port);

        let backend: Arc<dyn DiscoveryBackend> = match config.consul_host {
            Some(ref consul) => Arc::new(ConsulBackend::new(consul.as_str())?.with_check(
                ConsulCheck {
                    health_path: config.health_path.clone(),
                    interval: config.check_interval.clone(),
                    timeout: config.check_timeout.clone(),
                    deregister_critical_after: config.deregister_critical_after.clone(),
                },
            )),
            None => {
                warn!("No consul_host configured, registering with the in-memory backend");
                Arc::new(InMemoryBackend::new())
            }
        };

        let health = Arc::new(HealthAggregator::with_timeout(config.probe_timeout()));
        let bootstrap = Self::new(mode, resolver, ServiceRegistrar::new(backend), health)
            .await
            .with_deregister_timeout(config.deregister_timeout());
        Ok(bootstrap)
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// The aggregator served on the health endpoint
    pub fn health(&self) -> Arc<HealthAggregator> {
        Arc::clone(&self.health)
    }

    /// The advertised address, resolved on first use and fixed afterwards
    pub async fn address(&self) -> Result<&ServiceAddress> {
        let address = self
            .address
            .get_or_try_init(|| self.resolver.resolve(self.mode))
            .await?;
        Ok(address)
    }

    /// Resolve (once) and register. Any error here should abort startup.
    pub async fn on_start(&self, identity: &ServiceIdentity) -> Result<RegistrationHandle> {
        let address = self.address().await?;
        info!(
            mode = %self.mode,
            %address,
            service = %identity,
            backend = self.registrar.backend_name(),
            "Starting registration"
        );

        let probe: Arc<dyn HealthCheckUnit> = self.health.clone();
        let handle = self.registrar.register(identity, address, probe).await?;
        Ok(handle)
    }

    /// Best-effort withdrawal. Never fails and never waits longer than the
    /// deregister timeout.
    pub async fn on_stop(&self, handle: RegistrationHandle) {
        self.gate.close();

        match tokio::time::timeout(self.deregister_timeout, self.registrar.deregister(&handle))
            .await
        {
            Ok(Ok(())) => info!(id = handle.id(), "Shutdown deregistration complete"),
            Ok(Err(e)) => warn!(
                id = handle.id(),
                error = %e,
                "Deregistration failed, continuing shutdown"
            ),
            Err(_) => warn!(
                id = handle.id(),
                timeout_ms = self.deregister_timeout.as_millis() as u64,
                "Deregistration timed out, continuing shutdown"
            ),
        }
    }
}
