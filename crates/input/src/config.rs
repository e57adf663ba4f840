//! Configuration consulted during URI detection.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::InputError;

pub const INDEX_FILE: &str = "index_file";
pub const BASE_URL: &str = "base_url";
pub const URL_SUFFIX: &str = "url_suffix";

/// The index file marker used when the web server can only route through the query string.
pub const QUERY_STRING_INDEX_FILE: &str = "index.php?";

/// Read access to application configuration by key.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<&str>;
}

impl ConfigProvider for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// The three settings the URI detector reads.
///
/// ```
/// use micro_input::InputConfig;
///
/// let config = InputConfig::from_json(r#"{ "base_url": "http://example.com/app/", "url_suffix": ".json" }"#).unwrap();
/// assert_eq!(config.url_suffix.as_deref(), Some(".json"));
/// assert!(config.index_file.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Front controller name, e.g. `index.php`, or `index.php?` for pass-through routing.
    pub index_file: Option<String>,
    /// Application base url; only its path component is used.
    pub base_url: Option<String>,
    /// Suffix such as `.json` removed from detected URIs.
    pub url_suffix: Option<String>,
}

impl InputConfig {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path).map_err(InputError::io)?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = Some(index_file.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn url_suffix(mut self, url_suffix: impl Into<String>) -> Self {
        self.url_suffix = Some(url_suffix.into());
        self
    }
}

impl ConfigProvider for InputConfig {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            INDEX_FILE => &self.index_file,
            BASE_URL => &self.base_url,
            URL_SUFFIX => &self.url_suffix,
            _ => return None,
        };
        value.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_keys() {
        let config = InputConfig::default().index_file("index.php").base_url("/app/");
        assert_eq!(ConfigProvider::get(&config, INDEX_FILE), Some("index.php"));
        assert_eq!(ConfigProvider::get(&config, BASE_URL), Some("/app/"));
        assert_eq!(ConfigProvider::get(&config, URL_SUFFIX), None);
        assert_eq!(ConfigProvider::get(&config, "unknown"), None);
    }

    #[test]
    fn map_provider() {
        let mut map = HashMap::new();
        map.insert(URL_SUFFIX.to_owned(), ".html".to_owned());
        assert_eq!(ConfigProvider::get(&map, URL_SUFFIX), Some(".html"));
        assert_eq!(ConfigProvider::get(&map, BASE_URL), None);
    }

    #[test]
    fn invalid_json() {
        let result = InputConfig::from_json("{ \"index_file\": 3 }");
        assert!(matches!(result, Err(InputError::InvalidConfig { .. })));
    }

    #[test]
    fn missing_fields_default_to_none() {
        let config = InputConfig::from_json("{}").unwrap();
        assert_eq!(config, InputConfig::default());
    }
}
