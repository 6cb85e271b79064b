//! Pluggable transformation of values held in memory
//!
//! A [`SecretCacheHook`] sees every value on its way into and out of the
//! in-memory cache. The usual application is encrypting cached secrets at
//! rest in memory: `store` maps a typed value to [`CachedValue::Opaque`]
//! ciphertext and `retrieve` maps it back.

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::store::{SecretDescription, SecretValue};

/// A value held in the in-memory cache.
///
/// Entries store either secret metadata or a secret version value; a hook
/// may replace both with an opaque representation of its choosing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedValue {
    /// Secret metadata from a describe call
    Description(SecretDescription),

    /// A versioned secret value
    Secret(SecretValue),

    /// Hook-defined representation (e.g. ciphertext)
    Opaque(Vec<u8>),
}

impl From<SecretDescription> for CachedValue {
    fn from(value: SecretDescription) -> Self {
        CachedValue::Description(value)
    }
}

impl From<SecretValue> for CachedValue {
    fn from(value: SecretValue) -> Self {
        CachedValue::Secret(value)
    }
}

impl TryFrom<CachedValue> for SecretDescription {
    type Error = CacheError;

    fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
        match value {
            CachedValue::Description(description) => Ok(description),
            _ => Err(CacheError::Hook),
        }
    }
}

impl TryFrom<CachedValue> for SecretValue {
    type Error = CacheError;

    fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
        match value {
            CachedValue::Secret(secret) => Ok(secret),
            _ => Err(CacheError::Hook),
        }
    }
}

/// Hook invoked around the in-memory cache.
///
/// `retrieve` must invert `store`: whatever variant `store` was given,
/// `retrieve` has to produce that variant again. A hook that breaks this
/// contract surfaces as [`CacheError::Hook`] on read.
pub trait SecretCacheHook: Send + Sync {
    /// Prepare a value for storing in the cache.
    fn store(&self, value: CachedValue) -> CachedValue;

    /// Recover the original value from its stored form.
    fn retrieve(&self, value: CachedValue) -> CachedValue;
}
