//! Error types for the health endpoint

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for health endpoint operations
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors raised while serving health status.
///
/// Probe failures are never errors; they only degrade the reported status.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint could not bind its listening socket
    #[error("Failed to bind health endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error while accepting connections
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
