//! Top-level error type

use beacon_config::ConfigError;
use beacon_discovery::RegistrationError;
use beacon_health::HealthError;
use beacon_resolver::ResolveError;
use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Anything that aborts startup
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Address resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Health endpoint error: {0}")]
    Health(#[from] HealthError),

    #[error("Invalid listen address '{0}'")]
    ListenAddr(String),

    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Health endpoint stopped: {0}")]
    EndpointStopped(String),
}
