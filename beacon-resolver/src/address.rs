//! Advertised address and identity types

use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// The `(host, port)` an instance advertises to the discovery backend.
///
/// `host` is an IP literal or a syntactically valid hostname and `port` is
/// never zero; both are checked at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAddress")]
pub struct ServiceAddress {
    host: String,
    port: u16,
}

#[derive(Deserialize)]
struct RawAddress {
    host: String,
    port: u16,
}

impl TryFrom<RawAddress> for ServiceAddress {
    type Error = ResolveError;

    fn try_from(raw: RawAddress) -> Result<Self> {
        Self::new(raw.host, raw.port)
    }
}

impl ServiceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();

        if port == 0 {
            return Err(ResolveError::InvalidAddress("port must be in 1..=65535".into()));
        }
        if host.parse::<IpAddr>().is_err() && !is_valid_hostname(&host) {
            return Err(ResolveError::InvalidAddress(format!(
                "'{}' is neither an IP address nor a hostname",
                host
            )));
        }

        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for HTTP checks against this address
    pub fn url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => write!(f, "[{}]:{}", self.host, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// Name and version a service registers under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub name: String,
    pub version: String,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    host.trim_end_matches('.').split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        let v4 = ServiceAddress::new("10.42.0.7", 5000).unwrap();
        assert_eq!(v4.to_string(), "10.42.0.7:5000");
        assert_eq!(v4.url(), "http://10.42.0.7:5000");

        let v6 = ServiceAddress::new("fe80::1", 8080).unwrap();
        assert_eq!(v6.to_string(), "[fe80::1]:8080");

        let named = ServiceAddress::new("orders.internal", 443).unwrap();
        assert_eq!(named.host(), "orders.internal");
        assert_eq!(named.port(), 443);
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(ServiceAddress::new("10.0.0.1", 0).is_err());
        assert!(ServiceAddress::new("", 5000).is_err());
        assert!(ServiceAddress::new("bad host", 5000).is_err());
        assert!(ServiceAddress::new("-leading.dash", 5000).is_err());
        assert!(ServiceAddress::new("<html>", 5000).is_err());
    }

    #[test]
    fn test_deserialize_runs_checks() {
        let address: ServiceAddress =
            serde_json::from_str(r#"{"host": "10.42.0.7", "port": 5000}"#).unwrap();
        assert_eq!(address, ServiceAddress::new("10.42.0.7", 5000).unwrap());

        for raw in [
            r#"{"host": "10.42.0.7", "port": 0}"#,
            r#"{"host": "bad host", "port": 80}"#,
        ] {
            assert!(serde_json::from_str::<ServiceAddress>(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_identity_display() {
        let identity = ServiceIdentity::new("AspNetService", "1.0");
        assert_eq!(identity.to_string(), "AspNetService@1.0");
    }
}
