//! Error types for the secret cache
//!
//! Errors are cloneable so a failed refresh can be cached on the entry and
//! re-surfaced to every caller until the next successful refresh.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors produced by a [`SecretStore`](crate::store::SecretStore)
/// implementation.
///
/// The cache treats every variant the same way for retry purposes: the
/// failure is recorded on the entry and retried on the exponential backoff
/// schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network error (connection failed, DNS, timeout, etc.)
    #[error("transport error: {0}")]
    Transport(String),

    /// The store rejected the request (auth, validation, server error)
    #[error("service error: {0}")]
    Service(String),

    /// The requested secret or version does not exist
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The store is throttling requests
    #[error("throttled: {0}")]
    Throttled(String),
}

/// Errors returned by the cache API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The last refresh of the requested entry failed and no previously
    /// fetched value is available.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A configured cache hook returned a value that could not be converted
    /// back to the type it was given.
    #[error("cache hook returned an unexpected value type")]
    Hook,
}
