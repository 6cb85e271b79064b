//! # Secret Cache
//!
//! Read-through caching of secrets fetched from a remote store.
//!
//! ## Architecture
//!
//! ```text
//! SecretCache (facade)
//!   └── LruCache<secret id, SecretCacheItem>          top-level store
//!         └── SecretCacheItem                         metadata + TTL refresh
//!               └── LruCache<version id, SecretCacheVersion>   capacity 10
//!                     └── SecretCacheVersion          value refresh
//!                           └── SecretStore           remote capability
//! ```
//!
//! Refresh decisions (staleness, TTL, failure backoff) live in the shared
//! state machine in [`refresh`]; the item and version entries specialize it
//! with their fetch actions and value projections.
//!
//! ## Locking
//!
//! Each LRU store serializes its own operations with one internal mutex.
//! Each entry serializes its refresh and reads with its own async mutex,
//! which is the only lock held across a store call; this bounds the cache to
//! at most one in-flight store call per cached key.

pub mod lru;

mod item;
mod refresh;
mod version;

use std::sync::Arc;

use crate::config::SecretCacheConfig;
use crate::error::Result;
use crate::store::{SecretStore, SecretValue};

use item::SecretCacheItem;
pub use lru::LruCache;

/// In-memory read-through cache for secrets.
///
/// Entries are created lazily on first access and evicted in
/// least-recently-used order once the configured size is exceeded. Reads of
/// a cached secret never touch the store until the item TTL elapses.
pub struct SecretCache {
    /// The cached secret items
    cache: LruCache<String, Arc<SecretCacheItem>>,
    /// The cache configuration
    config: Arc<SecretCacheConfig>,
    /// The store shared by every entry
    client: Arc<dyn SecretStore>,
}

impl SecretCache {
    /// Create a cache over the given store with default configuration.
    pub fn new(client: Arc<dyn SecretStore>) -> Self {
        Self::with_config(client, SecretCacheConfig::default())
    }

    /// Create a cache over the given store with the given configuration.
    pub fn with_config(client: Arc<dyn SecretStore>, config: SecretCacheConfig) -> Self {
        Self {
            cache: LruCache::new(config.max_cache_size),
            config: Arc::new(config),
            client,
        }
    }

    /// Look up the cached item for `secret_id`, creating it on first access.
    fn cached_secret(&self, secret_id: &str) -> Arc<SecretCacheItem> {
        if let Some(item) = self.cache.get(secret_id) {
            return item;
        }
        let item = Arc::new(SecretCacheItem::new(
            secret_id.to_string(),
            self.client.clone(),
            self.config.clone(),
        ));
        self.cache.put_if_absent(secret_id.to_string(), item.clone());
        self.cache.get(secret_id).unwrap_or(item)
    }

    /// Retrieve the string payload of a secret.
    ///
    /// Returns `None` when no version carries the configured stage or the
    /// secret has no string payload.
    pub async fn get_secret_string(&self, secret_id: &str) -> Result<Option<String>> {
        let secret = self.cached_secret(secret_id);
        Ok(secret
            .get_secret_value()
            .await?
            .and_then(|value| value.secret_string))
    }

    /// Retrieve the binary payload of a secret.
    ///
    /// Each call returns an independent copy; mutating it cannot affect
    /// cached state. Returns `None` when no version carries the configured
    /// stage or the secret has no binary payload.
    pub async fn get_secret_binary(&self, secret_id: &str) -> Result<Option<Vec<u8>>> {
        let secret = self.cached_secret(secret_id);
        Ok(secret
            .get_secret_value()
            .await?
            .and_then(|value| value.secret_binary))
    }

    /// Retrieve the full cached value of a secret.
    pub async fn get_secret_value(&self, secret_id: &str) -> Result<Option<SecretValue>> {
        self.cached_secret(secret_id).get_secret_value().await
    }

    /// Force a refresh of the secret's metadata.
    ///
    /// Sleeps a randomized interval (2.5-5 s, longer while the entry is in
    /// failure backoff) before refreshing, to discourage tight-loop callers.
    /// Returns true if the forced refresh succeeded. Dropping the future
    /// aborts the wait.
    pub async fn refresh_now(&self, secret_id: &str) -> bool {
        self.cached_secret(secret_id).refresh_now().await
    }

    /// Close the cache, evicting all cached state.
    ///
    /// Idempotent; refreshes already in flight are unaffected.
    pub fn close(&self) {
        self.cache.clear();
    }
}
