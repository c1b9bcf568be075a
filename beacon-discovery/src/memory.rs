//! In-memory discovery backend (for testing)

use crate::service::{DiscoveryBackend, Registration, RegistrationError, Result};
use async_trait::async_trait;
use beacon_health::{HealthCheckUnit, HealthStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

struct Entry {
    registration: Registration,
    probe: Arc<dyn HealthCheckUnit>,
}

/// In-process backend for tests and local development.
///
/// Rejects a second registration of the same instance id, and can be
/// switched unreachable to exercise failure paths.
#[derive(Clone)]
pub struct InMemoryBackend {
    services: Arc<RwLock<HashMap<String, Entry>>>,
    reachable: Arc<AtomicBool>,
    removals: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    /// Create new in-memory backend
    pub fn new() -> Self {
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
            reachable: Arc::new(AtomicBool::new(true)),
            removals: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate losing (or regaining) the backend
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Invoke the stored probe, as the backend's periodic check would
    pub async fn poll(&self, id: &str) -> Option<HealthStatus> {
        let probe = {
            let services = self.services.read().await;
            Arc::clone(&services.get(id)?.probe)
        };
        Some(probe.probe().await)
    }

    /// Get a stored registration
    pub async fn get(&self, id: &str) -> Option<Registration> {
        self.services
            .read()
            .await
            .get(id)
            .map(|entry| entry.registration.clone())
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.services.read().await.contains_key(id)
    }

    /// Get count of registered services
    pub async fn count(&self) -> usize {
        self.services.read().await.len()
    }

    /// Number of successful removals so far
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RegistrationError::BackendUnreachable(
                "in-memory backend marked unreachable".to_string(),
            ))
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoveryBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(
        &self,
        registration: &Registration,
        probe: Arc<dyn HealthCheckUnit>,
    ) -> Result<String> {
        self.ensure_reachable()?;

        let mut services = self.services.write().await;
        if services.contains_key(&registration.id) {
            return Err(RegistrationError::RegistrationRejected(format!(
                "{} is already registered",
                registration.id
            )));
        }

        services.insert(
            registration.id.clone(),
            Entry {
                registration: registration.clone(),
                probe,
            },
        );
        Ok(registration.id.clone())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.ensure_reachable()?;

        self.services
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RegistrationError::NotRegistered(id.to_string()))?;
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
