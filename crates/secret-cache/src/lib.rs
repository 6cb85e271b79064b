//! # secret-cache
//!
//! In-process TTL read-through cache for remote secret stores.
//! Wraps any [`SecretStore`] implementation with bounded in-memory caching.
//!
//! ## Features
//! - Read-through caching with bounded LRU eviction
//! - Per-entry refresh state machine with exponential backoff and jitter
//! - At most one in-flight store call per cached key
//! - Stale values keep being served after a failed refresh
//! - Pluggable hook for transforming values held in memory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use secret_cache::SecretCache;
//!
//! let cache = SecretCache::new(Arc::new(my_store));
//! if let Some(password) = cache.get_secret_string("db-password").await? {
//!     connect(&password);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod hook;
pub mod store;

// Core types
pub use cache::{LruCache, SecretCache};
pub use config::SecretCacheConfig;

// Store abstraction
pub use store::{SecretDescription, SecretStore, SecretValue};

// Error and hook
pub use error::{CacheError, Result, StoreError};
pub use hook::{CachedValue, SecretCacheHook};
