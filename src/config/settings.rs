//! Settings structures for the drop-in configuration

use super::source::{ConfigSource, KEY_API_KEY, KEY_APPLICATION_ID, KEY_INDEX_NAME};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub algolia: AlgoliaSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that cannot be used at runtime
    pub fn validate(&self) -> Result<()> {
        self.outgoing.request_timeout()?;
        self.outgoing.init_timeout()?;
        Ok(())
    }

    /// Merge with environment variables (ALGOLIA_* and DROPIN_* prefixes)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ALGOLIA_APPLICATION_ID") {
            self.algolia.application_id = val;
        }
        if let Some(val) = lookup("ALGOLIA_API_KEY") {
            self.algolia.api_key = val;
        }
        if let Some(val) = lookup("ALGOLIA_INDEX_NAME") {
            self.algolia.index_name = val;
        }
        if let Some(val) = lookup("ALGOLIA_HOST") {
            self.algolia.host = Some(val);
        }
        if let Some(val) = lookup("DROPIN_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("DROPIN_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }
}

impl ConfigSource for Settings {
    fn get_config_value(&self, key: &str) -> Option<String> {
        let value = match key {
            KEY_APPLICATION_ID => &self.algolia.application_id,
            KEY_API_KEY => &self.algolia.api_key,
            KEY_INDEX_NAME => &self.algolia.index_name,
            _ => return None,
        };
        if value.is_empty() {
            None
        } else {
            Some(value.clone())
        }
    }
}

/// Algolia credentials and target index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlgoliaSettings {
    /// Algolia application id
    pub application_id: String,
    /// Search-only API key
    pub api_key: String,
    /// Index to query
    pub index_name: String,
    /// Override for the service base URL (defaults to the DSN host)
    pub host: Option<String>,
    /// Send a zero-hit probe during initialization
    pub verify_on_init: bool,
}

impl Default for AlgoliaSettings {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            api_key: String::new(),
            index_name: crate::search::DEFAULT_INDEX_NAME.to_string(),
            host: None,
            verify_on_init: false,
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Hits per page when the caller does not ask for a size
    pub hits_per_page: u32,
    /// Capacity of the recently viewed products list
    pub recent_products: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            hits_per_page: crate::search::DEFAULT_HITS_PER_PAGE,
            recent_products: 10,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound on the whole initialization sequence, in seconds
    pub init_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            init_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

impl OutgoingSettings {
    /// Default request timeout as a `Duration`
    pub fn request_timeout(&self) -> Result<Duration> {
        seconds("outgoing.request_timeout", self.request_timeout)
    }

    /// Initialization bound as a `Duration`
    pub fn init_timeout(&self) -> Result<Duration> {
        seconds("outgoing.init_timeout", self.init_timeout)
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| anyhow!("{} must be a positive number of seconds, got {}", name, value))
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.algolia.index_name, "products");
        assert_eq!(settings.search.hits_per_page, 20);
        assert!(settings.get_config_value(KEY_APPLICATION_ID).is_none());
    }

    #[test]
    fn test_yaml_keys_are_camel_case() {
        let settings = Settings::from_yaml(
            r#"
algolia:
  applicationId: APP123
  apiKey: secret
outgoing:
  request_timeout: 2.5
"#,
        )
        .unwrap();

        assert_eq!(settings.get_config_value(KEY_APPLICATION_ID).as_deref(), Some("APP123"));
        assert_eq!(settings.get_config_value(KEY_API_KEY).as_deref(), Some("secret"));
        assert_eq!(settings.get_config_value(KEY_INDEX_NAME).as_deref(), Some("products"));
        assert_eq!(settings.outgoing.request_timeout, 2.5);
        assert!(settings.get_config_value("algolia.unknown").is_none());
    }

    #[test]
    fn test_unusable_timeouts_are_rejected() {
        let err = Settings::from_yaml("outgoing:\n  init_timeout: -1\n").unwrap_err();
        assert!(err.to_string().contains("outgoing.init_timeout"));
        assert!(Settings::from_yaml("outgoing:\n  request_timeout: 0\n").is_err());
        assert!(Settings::from_yaml("outgoing:\n  request_timeout: .nan\n").is_err());
        assert!(Settings::from_yaml("outgoing:\n  init_timeout: .inf\n").is_err());

        let mut outgoing = OutgoingSettings::default();
        outgoing.request_timeout = -2.5;
        assert!(outgoing.request_timeout().is_err());
        assert_eq!(
            OutgoingSettings::default().init_timeout().unwrap(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_merge_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ALGOLIA_APPLICATION_ID", "ENVAPP"),
            ("ALGOLIA_INDEX_NAME", "catalog"),
            ("DROPIN_PORT", "not-a-port"),
            ("DROPIN_BIND_ADDRESS", "0.0.0.0"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.algolia.application_id, "ENVAPP");
        assert_eq!(settings.algolia.index_name, "catalog");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.bind_address, "0.0.0.0");
    }
}
