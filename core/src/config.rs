//! Client configuration.

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_RESOURCE: &str = "posts";

pub const BASE_URL_ENV: &str = "POSTS_BASE_URL";
pub const RESOURCE_ENV: &str = "POSTS_RESOURCE";

/// Where the remote collection lives.
///
/// Deserializable so hosts can embed it in their own config files; missing
/// keys fall back to the public jsonplaceholder demo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub resource: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read `POSTS_BASE_URL` / `POSTS_RESOURCE`, keeping defaults for unset
    /// or empty variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(resource) = lookup(RESOURCE_ENV).filter(|v| !v.is_empty()) {
            config.resource = resource;
        }
        config
    }
}
