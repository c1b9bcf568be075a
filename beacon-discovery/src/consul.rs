//! Consul agent backend

use crate::service::{DiscoveryBackend, Registration, RegistrationError, Result};
use async_trait::async_trait;
use beacon_health::HealthCheckUnit;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP check settings sent with every registration
#[derive(Debug, Clone)]
pub struct ConsulCheck {
    /// Path of the health endpoint on the advertised address
    pub health_path: String,
    pub interval: String,
    pub timeout: String,
    /// Consul reaps the service after the check stays critical this long
    pub deregister_critical_after: String,
}

impl Default for ConsulCheck {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            interval: "10s".to_string(),
            timeout: "5s".to_string(),
            deregister_critical_after: "1m".to_string(),
        }
    }
}

/// Registers services with a Consul agent.
///
/// Consul polls the instance's health endpoint itself; the probe passed to
/// [`put`](DiscoveryBackend::put) is only called once to seed the check's
/// initial status.
pub struct ConsulBackend {
    base_url: String,
    token: Option<String>,
    check: ConsulCheck,
    client: reqwest::Client,
}

impl ConsulBackend {
    /// Create new Consul backend
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use beacon_discovery::ConsulBackend;
    ///
    /// let consul = ConsulBackend::new("http://localhost:8500")?;
    /// ```
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RegistrationError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            check: ConsulCheck::default(),
            client,
        })
    }

    /// Set the HTTP check settings
    pub fn with_check(mut self, check: ConsulCheck) -> Self {
        self.check = check;
        self
    }

    /// Send an ACL token with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.put(url);
        match self.token {
            Some(ref token) => request.header("X-Consul-Token", token),
            None => request,
        }
    }

    fn payload(&self, registration: &Registration, passing: bool) -> serde_json::Value {
        let address = &registration.address;

        serde_json::json!({
            "ID": registration.id,
            "Name": registration.identity.name,
            "Address": address.host(),
            "Port": address.port(),
            "Tags": registration.tags,
            "Meta": registration.metadata,
            "Check": {
                "CheckID": format!("service:{}", registration.id),
                "Name": format!("{} health", registration.identity.name),
                "HTTP": format!("{}{}", address.url(), self.check.health_path),
                "Interval": self.check.interval,
                "Timeout": self.check.timeout,
                "DeregisterCriticalServiceAfter": self.check.deregister_critical_after,
                "Status": if passing { "passing" } else { "critical" },
            },
        })
    }
}

fn unreachable(e: reqwest::Error) -> RegistrationError {
    RegistrationError::BackendUnreachable(e.to_string())
}

#[async_trait]
impl DiscoveryBackend for ConsulBackend {
    fn name(&self) -> &'static str {
        "consul"
    }

    async fn put(
        &self,
        registration: &Registration,
        probe: Arc<dyn HealthCheckUnit>,
    ) -> Result<String> {
        let url = format!("{}/v1/agent/service/register", self.base_url);

        let initial = probe.probe().await;
        debug!(healthy = initial.healthy, "Seeding Consul check status");

        let payload = self.payload(registration, initial.healthy);
        let response = self
            .request(&url)
            .json(&payload)
            .send()
            .await
            .map_err(unreachable)?;

        if response.status().is_success() {
            info!("Registered service {} with Consul", registration.id);
            Ok(registration.id.clone())
        } else {
            let status = response.status().as_u16();
            let error = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(RegistrationError::RegistrationRejected(format!(
                "{} ({})",
                error.trim(),
                status
            )))
        }
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let url = format!("{}/v1/agent/service/deregister/{}", self.base_url, id);

        let response = self.request(&url).send().await.map_err(unreachable)?;

        if response.status().is_success() {
            info!("Deregistered service {} from Consul", id);
            Ok(())
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("Service {} was already gone from Consul", id);
            Ok(())
        } else {
            let error = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(RegistrationError::DeregistrationFailed(error))
        }
    }
}
