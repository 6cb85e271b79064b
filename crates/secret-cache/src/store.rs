//! Remote secret store abstraction
//!
//! The cache talks to the backing store through the [`SecretStore`] trait
//! only. Implementations wrap whatever transport the deployment uses; the
//! cache never inspects transport details and treats every failure uniformly.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Secret metadata returned by [`SecretStore::describe_secret`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretDescription {
    /// Mapping from version id to the staging labels attached to that
    /// version. `None` when the store returned no version information.
    pub version_ids_to_stages: Option<HashMap<String, Vec<String>>>,
}

/// A versioned secret value returned by [`SecretStore::get_secret_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretValue {
    /// The string payload, if the secret holds one
    pub secret_string: Option<String>,

    /// The binary payload, if the secret holds one
    pub secret_binary: Option<Vec<u8>>,

    /// Staging labels attached to this version
    pub version_stages: Option<Vec<String>>,
}

/// Capability for fetching secrets from a remote store.
///
/// Implementations must be safe for concurrent invocation; a single instance
/// is shared read-only across every cache entry.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the metadata for a secret (current version-to-stage mapping).
    async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription, StoreError>;

    /// Fetch the value of a specific secret version.
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: &str,
    ) -> Result<SecretValue, StoreError>;
}
