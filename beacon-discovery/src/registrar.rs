//! Registration lifecycle

use crate::service::{DiscoveryBackend, Registration, Result};
use beacon_health::HealthCheckUnit;
use beacon_resolver::{ServiceAddress, ServiceIdentity};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Lifecycle state of a [`RegistrationHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Registered,
    Deregistered,
}

/// An active registration.
///
/// Returned by [`ServiceRegistrar::register`] and owned by the caller.
/// Once deregistered it stays deregistered; registering again yields a new
/// handle.
#[derive(Debug)]
pub struct RegistrationHandle {
    id: String,
    identity: ServiceIdentity,
    address: ServiceAddress,
    state: Mutex<RegistrationState>,
}

impl RegistrationHandle {
    /// Backend id of the registration
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    pub async fn state(&self) -> RegistrationState {
        *self.state.lock().await
    }
}

/// Announces a service to a discovery backend and withdraws it again
pub struct ServiceRegistrar {
    backend: Arc<dyn DiscoveryBackend>,
}

impl ServiceRegistrar {
    pub fn new(backend: Arc<dyn DiscoveryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Register `identity` at `address` with `probe` as its liveness check.
    ///
    /// Fails with `RegistrationRejected` when the backend refuses and with
    /// `BackendUnreachable` when it cannot be contacted.
    pub async fn register(
        &self,
        identity: &ServiceIdentity,
        address: &ServiceAddress,
        probe: Arc<dyn HealthCheckUnit>,
    ) -> Result<RegistrationHandle> {
        let registration = Registration::new(identity.clone(), address.clone());
        debug!(
            backend = self.backend.name(),
            id = %registration.id,
            "Registering service"
        );

        let id = self.backend.put(&registration, probe).await?;
        info!(
            backend = self.backend.name(),
            %id,
            service = %identity,
            %address,
            "Service registered"
        );

        Ok(RegistrationHandle {
            id,
            identity: identity.clone(),
            address: address.clone(),
            state: Mutex::new(RegistrationState::Registered),
        })
    }

    /// Withdraw a registration.
    ///
    /// A handle that is already deregistered is left alone. If the backend
    /// call fails the handle stays registered so the call can be retried.
    pub async fn deregister(&self, handle: &RegistrationHandle) -> Result<()> {
        let mut state = handle.state.lock().await;
        if *state == RegistrationState::Deregistered {
            debug!(id = %handle.id, "Registration already withdrawn");
            return Ok(());
        }

        self.backend.remove(&handle.id).await?;
        *state = RegistrationState::Deregistered;
        info!(backend = self.backend.name(), id = %handle.id, "Service deregistered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::service::RegistrationError;
    use beacon_health::{HealthAggregator, ReadinessGate};

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new("AspNetService", "1.0")
    }

    fn address() -> ServiceAddress {
        ServiceAddress::new("10.42.13.7", 5000).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_deregister() {
        let backend = InMemoryBackend::new();
        let registrar = ServiceRegistrar::new(Arc::new(backend.clone()));

        let handle = registrar
            .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
            .await
            .unwrap();
        assert_eq!(handle.state().await, RegistrationState::Registered);
        assert!(backend.contains(handle.id()).await);
        assert_eq!(handle.address(), &address());

        registrar.deregister(&handle).await.unwrap();
        assert_eq!(handle.state().await, RegistrationState::Deregistered);
        assert!(!backend.contains(handle.id()).await);
    }

    #[tokio::test]
    async fn test_deregister_is_idempotent() {
        let backend = InMemoryBackend::new();
        let registrar = ServiceRegistrar::new(Arc::new(backend.clone()));
        let handle = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap();

        registrar.deregister(&handle).await.unwrap();
        registrar.deregister(&handle).await.unwrap();

        assert_eq!(backend.removals(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_rejected() {
        let registrar = ServiceRegistrar::new(Arc::new(InMemoryBackend::new()));
        let _first = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap();

        let err = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::RegistrationRejected(_)));
    }

    #[tokio::test]
    async fn test_failed_deregister_can_be_retried() {
        let backend = InMemoryBackend::new();
        let registrar = ServiceRegistrar::new(Arc::new(backend.clone()));
        let handle = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap();

        backend.set_reachable(false);
        let err = registrar.deregister(&handle).await.unwrap_err();
        assert!(matches!(err, RegistrationError::BackendUnreachable(_)));
        assert_eq!(handle.state().await, RegistrationState::Registered);

        backend.set_reachable(true);
        registrar.deregister(&handle).await.unwrap();
        assert_eq!(handle.state().await, RegistrationState::Deregistered);
    }

    #[tokio::test]
    async fn test_reregistration_yields_new_handle() {
        let backend = InMemoryBackend::new();
        let registrar = ServiceRegistrar::new(Arc::new(backend.clone()));

        let first = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap();
        registrar.deregister(&first).await.unwrap();

        let second = registrar
            .register(&identity(), &address(), Arc::new(ReadinessGate::new()))
            .await
            .unwrap();
        assert_eq!(first.state().await, RegistrationState::Deregistered);
        assert_eq!(second.state().await, RegistrationState::Registered);
    }
}
