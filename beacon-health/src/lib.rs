//! Health checking for Beacon services
//!
//! Pluggable [`HealthCheckUnit`]s are composed by a [`HealthAggregator`],
//! which probes them concurrently with a per-unit timeout. The aggregate is
//! exposed over HTTP by [`HealthServer`] and handed to the discovery
//! backend as the instance's liveness probe.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beacon_health::*;
//! use std::sync::Arc;
//!
//! let aggregator = Arc::new(HealthAggregator::new());
//! aggregator.register(HttpDependencyCheck::new("orders-db", "http://orders-db:8080/ping")).await;
//!
//! let server = HealthServer::bind("0.0.0.0:5000".parse()?, aggregator.clone(), "/health").await?;
//! tokio::spawn(server.serve(std::future::pending()));
//! ```

pub mod aggregator;
pub mod error;
pub mod server;
pub mod status;
pub mod unit;

pub use aggregator::{HealthAggregator, TIMEOUT_DETAIL};
pub use error::{HealthError, Result};
pub use server::HealthServer;
pub use status::HealthStatus;
pub use unit::{FnCheck, HealthCheckUnit, HttpDependencyCheck, ReadinessGate};
