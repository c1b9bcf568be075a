//! Advertised address resolution per deployment mode

use crate::address::ServiceAddress;
use crate::error::{ResolveError, Result};
use crate::metadata::{self, MetadataClient};
use crate::mode::DeploymentMode;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::{info, warn};

/// Lists `(interface name, address)` pairs for local introspection
pub type InterfaceLister = Arc<dyn Fn() -> Vec<(String, IpAddr)> + Send + Sync>;

/// Derives the canonical `(host, port)` to advertise.
///
/// | mode | host | port |
/// |---|---|---|
/// | `Containerized` | `self/container/primary_ip` | service port |
/// | `HostNetworked` | `self/host/agent_ip` | prefix of `self/service/ports/0` |
/// | `Local` | first non-loopback IPv4 | service port |
pub struct AddressResolver {
    metadata: MetadataClient,
    service_port: u16,
    interfaces: InterfaceLister,
}

impl AddressResolver {
    pub fn new(metadata: MetadataClient, service_port: u16) -> Self {
        Self {
            metadata,
            service_port,
            interfaces: Arc::new(system_interfaces),
        }
    }

    /// Replace local interface introspection
    pub fn with_interfaces(
        mut self,
        lister: impl Fn() -> Vec<(String, IpAddr)> + Send + Sync + 'static,
    ) -> Self {
        self.interfaces = Arc::new(lister);
        self
    }

    /// Resolve the address for `mode`. Not retried on failure.
    pub async fn resolve(&self, mode: DeploymentMode) -> Result<ServiceAddress> {
        let address = match mode {
            DeploymentMode::Containerized => {
                let host = self.metadata_host(metadata::CONTAINER_PRIMARY_IP).await?;
                self.fixed_port(host)?
            }
            DeploymentMode::HostNetworked => {
                let raw_port = self.metadata.fetch(metadata::SERVICE_PORT).await?;
                let port = parse_published_port(&raw_port)?;
                let host = self.metadata_host(metadata::HOST_AGENT_IP).await?;
                ServiceAddress::new(host, port)
                    .map_err(|e| ResolveError::malformed(metadata::HOST_AGENT_IP, e.to_string()))?
            }
            DeploymentMode::Local => {
                let ip = first_non_loopback_ipv4((self.interfaces)())
                    .ok_or(ResolveError::NoLocalAddress)?;
                self.fixed_port(ip.to_string())?
            }
        };

        info!(%mode, %address, "Resolved advertised address");
        Ok(address)
    }

    async fn metadata_host(&self, path: &str) -> Result<String> {
        let host = self.metadata.fetch(path).await?;
        if host.is_empty() {
            return Err(ResolveError::malformed(path, "empty body"));
        }
        if ServiceAddress::new(host.as_str(), 1).is_err() {
            return Err(ResolveError::malformed(path, format!("'{}' is not a host", host)));
        }
        Ok(host)
    }

    fn fixed_port(&self, host: String) -> Result<ServiceAddress> {
        ServiceAddress::new(host, self.service_port)
    }
}

/// Take the numeric prefix before the first `:` of a published port value
/// such as `8080:5000/tcp`.
pub fn parse_published_port(raw: &str) -> Result<u16> {
    let path = metadata::SERVICE_PORT;

    let (prefix, _) = raw
        .split_once(':')
        .ok_or_else(|| ResolveError::malformed(path, format!("no ':' in '{}'", raw)))?;

    match prefix.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ResolveError::malformed(
            path,
            format!("'{}' is not a port number", prefix),
        )),
        Ok(port) => Ok(port),
    }
}

/// First IPv4 address that is neither loopback nor unspecified
pub fn first_non_loopback_ipv4<I>(interfaces: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = (String, IpAddr)>,
{
    interfaces.into_iter().find_map(|(_, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}

fn system_interfaces() -> Vec<(String, IpAddr)> {
    match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!(error = %e, "Failed to list network interfaces");
            Vec::new()
        }
    }
}
