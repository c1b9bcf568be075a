//! Deployment topology

use std::fmt;

/// Network topology the instance runs under.
///
/// Decided once at startup from the deployment-mode signal; unknown or
/// missing signals fall back to [`DeploymentMode::Local`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Inside the orchestrator's container network
    Containerized,
    /// On the host network behind a port mapping
    HostNetworked,
    /// Plain developer machine
    #[default]
    Local,
}

impl DeploymentMode {
    /// Parse the raw signal value.
    ///
    /// `true`/`container` select the container network and `host` the host
    /// network; anything else is local.
    pub fn from_signal(signal: Option<&str>) -> Self {
        let Some(raw) = signal else {
            return Self::Local;
        };

        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "container" | "containerized" => Self::Containerized,
            "host" | "host-networked" => Self::HostNetworked,
            _ => Self::Local,
        }
    }

    /// Whether resolution needs the orchestrator metadata endpoint
    pub fn uses_metadata(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Containerized => write!(f, "containerized"),
            Self::HostNetworked => write!(f, "host-networked"),
            Self::Local => write!(f, "local"),
        }
    }
}
