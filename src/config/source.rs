//! Key/value configuration lookup

use std::collections::HashMap;

pub const KEY_APPLICATION_ID: &str = "algolia.applicationId";
pub const KEY_API_KEY: &str = "algolia.apiKey";
pub const KEY_INDEX_NAME: &str = "algolia.indexName";

/// Synchronous lookup of configuration values by dotted key.
pub trait ConfigSource: Send + Sync {
    fn get_config_value(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get_config_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Reads `ALGOLIA_APPLICATION_ID`, `ALGOLIA_API_KEY` and `ALGOLIA_INDEX_NAME`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl EnvSource {
    fn var_for(key: &str) -> Option<&'static str> {
        match key {
            KEY_APPLICATION_ID => Some("ALGOLIA_APPLICATION_ID"),
            KEY_API_KEY => Some("ALGOLIA_API_KEY"),
            KEY_INDEX_NAME => Some("ALGOLIA_INDEX_NAME"),
            _ => None,
        }
    }
}

impl ConfigSource for EnvSource {
    fn get_config_value(&self, key: &str) -> Option<String> {
        Self::var_for(key).and_then(|var| std::env::var(var).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source() {
        let mut map = HashMap::new();
        map.insert(KEY_INDEX_NAME.to_string(), "shoes".to_string());

        assert_eq!(map.get_config_value(KEY_INDEX_NAME).as_deref(), Some("shoes"));
        assert!(map.get_config_value(KEY_API_KEY).is_none());
    }

    #[test]
    fn test_env_source_ignores_unknown_keys() {
        assert!(EnvSource.get_config_value("algolia.somethingElse").is_none());
        assert_eq!(EnvSource::var_for(KEY_API_KEY), Some("ALGOLIA_API_KEY"));
    }
}
