//! Cached secret version entry

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::refresh::RefreshState;
use crate::config::SecretCacheConfig;
use crate::error::CacheError;
use crate::store::{SecretStore, SecretValue};

/// A cached secret version, identified by (secret id, version id).
///
/// Refreshing fetches the version's value from the store; the projected
/// value is the fetched result itself.
pub(crate) struct SecretCacheVersion {
    secret_id: String,
    version_id: String,
    client: Arc<dyn SecretStore>,
    config: Arc<SecretCacheConfig>,
    /// Serializes refresh and read for this version; at most one store call
    /// is in flight per version at any time.
    state: Mutex<RefreshState<SecretValue>>,
}

impl PartialEq for SecretCacheVersion {
    fn eq(&self, other: &Self) -> bool {
        self.secret_id == other.secret_id && self.version_id == other.version_id
    }
}

impl Eq for SecretCacheVersion {}

impl SecretCacheVersion {
    pub fn new(
        secret_id: String,
        version_id: String,
        client: Arc<dyn SecretStore>,
        config: Arc<SecretCacheConfig>,
    ) -> Self {
        Self {
            secret_id,
            version_id,
            client,
            config,
            state: Mutex::new(RefreshState::new()),
        }
    }

    async fn refresh(&self, state: &mut RefreshState<SecretValue>) {
        if !state.is_refresh_needed(Instant::now()) {
            return;
        }
        state.begin_refresh();
        match self
            .client
            .get_secret_value(&self.secret_id, &self.version_id)
            .await
        {
            Ok(value) => {
                debug!(
                    secret_id = %self.secret_id,
                    version_id = %self.version_id,
                    "refreshed secret value"
                );
                state.record_success(value, self.config.cache_hook.as_deref());
            }
            Err(err) => {
                let wait = state.record_failure(err.clone(), Instant::now());
                warn!(
                    secret_id = %self.secret_id,
                    version_id = %self.version_id,
                    error = %err,
                    retry_in = ?wait,
                    "secret value refresh failed"
                );
            }
        }
    }

    /// Return the cached secret value, refreshing it first if needed.
    ///
    /// Fails with the pending store error when no value has ever been
    /// fetched; once a fetch succeeded, the last good value is served.
    /// The returned value is an independent copy of the cached state.
    pub async fn get_secret_value(&self) -> Result<Option<SecretValue>, CacheError> {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await;
        let cached = state.cached(self.config.cache_hook.as_deref())?;
        if cached.is_none() {
            if let Some(err) = state.pending_error() {
                return Err(err.clone().into());
            }
        }
        Ok(cached)
    }
}
