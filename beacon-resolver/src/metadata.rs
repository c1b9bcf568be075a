//! Orchestrator metadata client

use crate::error::{ResolveError, Result};
use std::time::Duration;
use tracing::debug;

/// Metadata path holding the container's primary IP
pub const CONTAINER_PRIMARY_IP: &str = "self/container/primary_ip";
/// Metadata path holding the host agent IP
pub const HOST_AGENT_IP: &str = "self/host/agent_ip";
/// Metadata path holding the first published port (`public:private/proto`)
pub const SERVICE_PORT: &str = "self/service/ports/0";

/// Plain-HTTP client for the local metadata endpoint.
///
/// Every call re-fetches; metadata such as the published port can change
/// across orchestrator restarts. There is no retry, but each request is
/// bounded by a timeout so a hung endpoint cannot block startup forever.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    base_url: String,
    client: reqwest::Client,
}

impl MetadataClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://rancher-metadata/2015-12-19";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}/{path}` and return the trimmed body
    pub async fn fetch(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let response = self.client.get(&url).send().await.map_err(|e| {
            ResolveError::MetadataUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::MetadataUnavailable {
                url,
                reason: format!("status {}", status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::MetadataUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        debug!(%url, value = %body.trim(), "Fetched metadata");
        Ok(body.trim().to_string())
    }
}
