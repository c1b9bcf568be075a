//! Advertised address resolution for Beacon services
//!
//! A service instance can run inside the orchestrator's container network,
//! on the host network behind a port mapping, or directly on a developer
//! machine. [`AddressResolver`] derives the single `(host, port)` the
//! instance should register under for each case, consulting the
//! orchestrator metadata endpoint through [`MetadataClient`] when needed.
//!
//! ```rust,ignore
//! use beacon_resolver::*;
//!
//! let metadata = MetadataClient::new(MetadataClient::DEFAULT_BASE_URL)?;
//! let resolver = AddressResolver::new(metadata, 5000);
//!
//! // `deployment_mode` (alias `rancher`) or `BEACON_DEPLOYMENT_MODE`
//! let config = beacon_config::BeaconConfig::load(None)?;
//! let mode = DeploymentMode::from_signal(config.deployment_mode.as_deref());
//! let address = resolver.resolve(mode).await?;
//! ```

pub mod address;
pub mod error;
pub mod metadata;
pub mod mode;
pub mod resolver;

pub use address::{ServiceAddress, ServiceIdentity};
pub use error::{ResolveError, Result};
pub use metadata::MetadataClient;
pub use mode::DeploymentMode;
pub use resolver::{AddressResolver, InterfaceLister, first_non_loopback_ipv4, parse_published_port};
