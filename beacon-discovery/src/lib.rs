//! Service registration for Beacon services
//!
//! A [`ServiceRegistrar`] announces a service's identity and resolved
//! address to a [`DiscoveryBackend`], attaching a health probe the backend
//! uses to decide whether to keep routing to the instance, and withdraws the
//! registration at shutdown.
//!
//! ## Backends
//!
//! - [`ConsulBackend`] - Consul agent HTTP API with an HTTP check
//! - [`InMemoryBackend`] - in-process fake for tests and local runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beacon_discovery::*;
//! use beacon_health::HealthAggregator;
//! use beacon_resolver::{ServiceAddress, ServiceIdentity};
//! use std::sync::Arc;
//!
//! let registrar = ServiceRegistrar::new(Arc::new(ConsulBackend::new("http://consul:8500")?));
//! let handle = registrar
//!     .register(
//!         &ServiceIdentity::new("orders", "1.0"),
//!         &ServiceAddress::new("10.42.13.7", 5000)?,
//!         Arc::new(HealthAggregator::new()),
//!     )
//!     .await?;
//!
//! // ... serve traffic ...
//!
//! registrar.deregister(&handle).await?;
//! ```

pub mod consul;
pub mod memory;
pub mod registrar;
pub mod service;

pub use consul::{ConsulBackend, ConsulCheck};
pub use memory::InMemoryBackend;
pub use registrar::{RegistrationHandle, RegistrationState, ServiceRegistrar};
pub use service::{DiscoveryBackend, Registration, RegistrationError, Result};
