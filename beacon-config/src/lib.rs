//! Layered configuration for the Beacon bootstrap.
//!
//! Values are resolved in three layers, later layers winning:
//!
//! 1. built-in defaults ([`BeaconConfig::default`])
//! 2. an optional JSON, TOML or `.env` file
//! 3. environment variables prefixed with `BEACON_`
//!
//! ```rust,ignore
//! use beacon_config::BeaconConfig;
//! use std::path::Path;
//!
//! let config = BeaconConfig::load(Some(Path::new("appsettings.json")))?;
//! println!("advertising {} on port {}", config.service_name, config.service_port);
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Prefix for environment overrides (`BEACON_SERVICE_PORT`, ...)
pub const ENV_PREFIX: &str = "BEACON";

/// Bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Raw deployment-mode signal; parsed by the resolver
    pub deployment_mode: Option<String>,
    pub service_name: String,
    pub service_version: String,
    /// Well-known port the service listens on
    pub service_port: u16,
    /// Interface the health endpoint binds to
    pub listen_addr: String,
    pub health_path: String,
    /// Base URL of the orchestrator metadata service
    pub metadata_url: String,
    pub metadata_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub deregister_timeout_ms: u64,
    /// Consul agent URL; the in-memory backend is used when unset
    pub consul_host: Option<String>,
    pub check_interval: String,
    pub check_timeout: String,
    pub deregister_critical_after: String,
    /// Optional dependency URL probed by the example health check
    pub dependency_url: Option<String>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            deployment_mode: None,
            service_name: "beacon-service".to_string(),
            service_version: "1.0".to_string(),
            service_port: 5000,
            listen_addr: "0.0.0.0".to_string(),
            health_path: "/health".to_string(),
            metadata_url: "http://rancher-metadata/2015-12-19".to_string(),
            metadata_timeout_ms: 5_000,
            probe_timeout_ms: 3_000,
            deregister_timeout_ms: 5_000,
            consul_host: None,
            check_interval: "10s".to_string(),
            check_timeout: "5s".to_string(),
            deregister_critical_after: "1m".to_string(),
            dependency_url: None,
        }
    }
}

impl BeaconConfig {
    /// Load defaults, then `file` (if any), then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let env = EnvLoader::new(Some(ENV_PREFIX.to_string())).load();
        Self::layered(file, env)
    }

    /// Seed the process environment from a `.env` file.
    ///
    /// A missing default `.env` is not an error; an explicit path must exist.
    pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(())
    }

    /// Build a configuration from an optional file and explicit env values
    pub fn layered(file: Option<&Path>, env: HashMap<String, String>) -> Result<Self> {
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ConfigError::LoadError("defaults are not an object".into())),
        };

        if let Some(path) = file {
            let value = ConfigLoader::auto(path)?.load_file(path)?;
            debug!(path = %path.display(), "Loaded configuration file");
            overlay_file(&mut merged, value)?;
        }

        overlay_env(&mut merged, env)?;

        let config: Self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn deregister_timeout(&self) -> Duration {
        Duration::from_millis(self.deregister_timeout_ms)
    }
}

impl Validate for BeaconConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.service_name, "service_name")?;
        ConfigValidator::not_empty(&self.service_version, "service_version")?;
        ConfigValidator::is_port(self.service_port, "service_port")?;
        ConfigValidator::not_empty(&self.listen_addr, "listen_addr")?;
        if !self.health_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "health_path must start with '/'".to_string(),
            ));
        }
        ConfigValidator::is_url(&self.metadata_url, "metadata_url")?;
        ConfigValidator::in_range(self.metadata_timeout_ms, 1, 600_000, "metadata_timeout_ms")?;
        ConfigValidator::in_range(self.probe_timeout_ms, 1, 600_000, "probe_timeout_ms")?;
        ConfigValidator::in_range(
            self.deregister_timeout_ms,
            1,
            600_000,
            "deregister_timeout_ms",
        )?;
        if let Some(ref consul) = self.consul_host {
            ConfigValidator::is_url(consul, "consul_host")?;
        }
        Ok(())
    }
}

/// Map legacy and camel-cased keys onto field names
fn normalize_key(key: &str) -> String {
    let lowered = key.to_lowercase();
    match lowered.as_str() {
        "rancher" | "deploymentmode" => "deployment_mode".to_string(),
        "consulhost" => "consul_host".to_string(),
        _ => lowered,
    }
}

fn overlay_file(target: &mut Map<String, Value>, value: Value) -> Result<()> {
    let Value::Object(map) = value else {
        return Err(ConfigError::ParseError(
            "configuration file must contain a table/object".to_string(),
        ));
    };

    for (key, value) in map {
        target.insert(normalize_key(&key), value);
    }
    Ok(())
}

/// Env values are strings; coerce each to the JSON type of the existing value.
fn overlay_env(target: &mut Map<String, Value>, env: HashMap<String, String>) -> Result<()> {
    for (key, raw) in env {
        let key = normalize_key(&key);
        let value = match target.get(&key) {
            Some(Value::Number(_)) => raw
                .trim()
                .parse::<u64>()
                .map(Value::from)
                .map_err(|_| ConfigError::ParseError(format!("{} must be a number", key)))?,
            Some(Value::Bool(_)) => raw
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| ConfigError::ParseError(format!("{} must be a boolean", key)))?,
            _ => Value::String(raw),
        };
        target.insert(key, value);
    }
    Ok(())
}
