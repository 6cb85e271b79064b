//! Cache configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::hook::SecretCacheHook;

/// The default maximum number of cached secrets.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1024;

/// The default TTL for cached secret metadata before an access causes a
/// refresh.
pub const DEFAULT_CACHE_ITEM_TTL: Duration = Duration::from_secs(60 * 60);

/// The default version stage used when resolving secret values.
pub const DEFAULT_VERSION_STAGE: &str = "AWSCURRENT";

/// Configuration for a [`SecretCache`](crate::SecretCache) instance.
///
/// Immutable once the cache is constructed.
#[derive(Clone)]
pub struct SecretCacheConfig {
    /// Maximum number of cached secrets before least-recently-used entries
    /// are evicted. Zero falls back to [`DEFAULT_MAX_CACHE_SIZE`].
    pub max_cache_size: usize,

    /// How long cached secret metadata stays valid. An access after the TTL
    /// elapsed refreshes the entry synchronously; if that refresh fails, the
    /// stale value keeps being served.
    pub cache_item_ttl: Duration,

    /// The staging label identifying the version to resolve
    pub version_stage: String,

    /// Optional hook transforming values held in memory
    pub cache_hook: Option<Arc<dyn SecretCacheHook>>,
}

impl Default for SecretCacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            cache_item_ttl: DEFAULT_CACHE_ITEM_TTL,
            version_stage: DEFAULT_VERSION_STAGE.to_string(),
            cache_hook: None,
        }
    }
}

impl SecretCacheConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached secrets
    pub fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    /// Set the TTL for cached secret metadata
    pub fn with_cache_item_ttl(mut self, cache_item_ttl: Duration) -> Self {
        self.cache_item_ttl = cache_item_ttl;
        self
    }

    /// Set the version stage used when resolving secret values
    pub fn with_version_stage(mut self, version_stage: impl Into<String>) -> Self {
        self.version_stage = version_stage.into();
        self
    }

    /// Set the hook transforming values held in memory
    pub fn with_cache_hook(mut self, cache_hook: Arc<dyn SecretCacheHook>) -> Self {
        self.cache_hook = Some(cache_hook);
        self
    }
}

impl fmt::Debug for SecretCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCacheConfig")
            .field("max_cache_size", &self.max_cache_size)
            .field("cache_item_ttl", &self.cache_item_ttl)
            .field("version_stage", &self.version_stage)
            .field("cache_hook", &self.cache_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecretCacheConfig::default();
        assert_eq!(config.max_cache_size, 1024);
        assert_eq!(config.cache_item_ttl, Duration::from_secs(3600));
        assert_eq!(config.version_stage, "AWSCURRENT");
        assert!(config.cache_hook.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SecretCacheConfig::new()
            .with_max_cache_size(10)
            .with_cache_item_ttl(Duration::from_millis(500))
            .with_version_stage("STAGING");
        assert_eq!(config.max_cache_size, 10);
        assert_eq!(config.cache_item_ttl, Duration::from_millis(500));
        assert_eq!(config.version_stage, "STAGING");
    }
}
