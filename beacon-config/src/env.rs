// Environment variable loading

use std::collections::HashMap;
use std::env;

/// Environment variable loader
///
/// Keys are matched against `PREFIX_` and returned lower-cased with the
/// prefix stripped, so `BEACON_SERVICE_PORT` becomes `service_port`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching variables from the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.load_from(env::vars())
    }

    /// Load matching variables from an arbitrary key/value source
    pub fn load_from<I, K, V>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            let key = key.as_ref();
            match self.prefix {
                Some(ref prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                        if let Some(trimmed) = rest.strip_prefix('_') {
                            config.insert(trimmed.to_lowercase(), value.into());
                        }
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value.into());
                }
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
