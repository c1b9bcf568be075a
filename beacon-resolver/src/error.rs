//! Error types for address resolution

use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Resolution failures.
///
/// All of these are fatal at startup: advertising an unconfirmed address is
/// worse than refusing to start.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Metadata endpoint unreachable, timed out, or answered non-2xx
    #[error("Metadata unavailable at {url}: {reason}")]
    MetadataUnavailable { url: String, reason: String },

    /// Metadata answered but the value cannot be used
    #[error("Malformed metadata for '{path}': {reason}")]
    MalformedMetadata { path: String, reason: String },

    /// No usable address on any local interface
    #[error("No non-loopback IPv4 address found on local interfaces")]
    NoLocalAddress,

    /// A host/port pair that violates address invariants
    #[error("Invalid service address: {0}")]
    InvalidAddress(String),

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ResolveError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
