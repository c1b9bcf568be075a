//! Service registration records and the discovery backend capability

use async_trait::async_trait;
use beacon_health::HealthCheckUnit;
use beacon_resolver::{ServiceAddress, ServiceIdentity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The backend could not be contacted at all
    #[error("Discovery backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The backend answered and refused the registration
    #[error("Registration rejected: {0}")]
    RegistrationRejected(String),

    #[error("Deregistration failed: {0}")]
    DeregistrationFailed(String),

    /// Removal of an id the backend does not know
    #[error("Service not registered: {0}")]
    NotRegistered(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for registration operations
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// What gets announced to the discovery backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Instance id, unique per advertised address
    pub id: String,

    pub identity: ServiceIdentity,

    pub address: ServiceAddress,

    /// Service tags; the version is always included
    pub tags: Vec<String>,

    pub metadata: HashMap<String, String>,
}

impl Registration {
    /// Build the record for `identity` at `address`
    pub fn new(identity: ServiceIdentity, address: ServiceAddress) -> Self {
        let id = format!("{}-{}-{}", identity.name, address.host(), address.port());
        let mut metadata = HashMap::new();
        metadata.insert("version".to_string(), identity.version.clone());

        Self {
            id,
            tags: vec![identity.version.clone()],
            identity,
            address,
            metadata,
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A service-discovery backend.
///
/// The backend owns the polling cadence of the supplied probe; this side
/// only guarantees the probe can be called at any time after `put`.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Announce a registration and attach its liveness probe.
    /// Returns the backend's id for the registration.
    async fn put(
        &self,
        registration: &Registration,
        probe: Arc<dyn HealthCheckUnit>,
    ) -> Result<String>;

    /// Remove a registration by backend id
    async fn remove(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_record() {
        let registration = Registration::new(
            ServiceIdentity::new("AspNetService", "1.0"),
            ServiceAddress::new("10.42.13.7", 5000).unwrap(),
        )
        .with_tag("rancher")
        .with_metadata("mode", "containerized");

        assert_eq!(registration.id, "AspNetService-10.42.13.7-5000");
        assert_eq!(registration.tags, vec!["1.0", "rancher"]);
        assert_eq!(registration.metadata.get("version"), Some(&"1.0".to_string()));
        assert_eq!(registration.metadata.get("mode"), Some(&"containerized".to_string()));
    }
}
