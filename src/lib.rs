//! # Beacon
//!
//! Self-registering service bootstrap. On startup a service works out the
//! address it is reachable at (inside an orchestrator's container network,
//! on a host network behind a port mapping, or on a plain machine),
//! registers that address with a discovery backend, and serves a health
//! status the backend polls. On shutdown it withdraws the registration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beacon::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BootstrapError> {
//!     let config = BeaconConfig::load(None)?;
//!     let bootstrap = ServiceBootstrap::from_config(&config).await?;
//!
//!     let identity = ServiceIdentity::new(&config.service_name, &config.service_version);
//!     let handle = bootstrap.on_start(&identity).await?;
//!
//!     let shutdown = shutdown_signal().map_err(BootstrapError::Signal)?;
//!     shutdown.await;
//!     bootstrap.on_stop(handle).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`beacon_config`] - layered configuration
//! - [`beacon_resolver`] - deployment modes and address resolution
//! - [`beacon_health`] - health units, aggregation, health endpoint
//! - [`beacon_discovery`] - registrar and discovery backends

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use beacon_config as config;
pub use beacon_discovery as discovery;
pub use beacon_health as health;
pub use beacon_resolver as resolver;

pub use bootstrap::ServiceBootstrap;
pub use error::{BootstrapError, Result};
pub use shutdown::{ShutdownTrigger, shutdown_signal, until_shutdown};

pub mod prelude {
    pub use crate::bootstrap::ServiceBootstrap;
    pub use crate::error::BootstrapError;
    pub use crate::shutdown::shutdown_signal;
    pub use beacon_config::BeaconConfig;
    pub use beacon_discovery::{
        ConsulBackend, DiscoveryBackend, InMemoryBackend, RegistrationHandle, ServiceRegistrar,
    };
    pub use beacon_health::{
        FnCheck, HealthAggregator, HealthCheckUnit, HealthServer, HealthStatus,
        HttpDependencyCheck, ReadinessGate,
    };
    pub use beacon_resolver::{
        AddressResolver, DeploymentMode, MetadataClient, ServiceAddress, ServiceIdentity,
    };
}
