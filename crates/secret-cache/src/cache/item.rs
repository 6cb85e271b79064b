//! Cached secret item entry

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::lru::LruCache;
use crate::cache::refresh::RefreshState;
use crate::cache::version::SecretCacheVersion;
use crate::config::SecretCacheConfig;
use crate::error::CacheError;
use crate::store::{SecretDescription, SecretStore, SecretValue};

/// Capacity of the per-item store of cached versions.
const VERSION_CACHE_SIZE: usize = 10;

/// A cached secret, identified by its secret id.
///
/// Refreshing fetches the secret's metadata (version-to-stage mapping) and
/// schedules the next TTL refresh. Reads resolve the version carrying the
/// configured stage and delegate to the matching [`SecretCacheVersion`],
/// lazily created in the nested version store.
pub(crate) struct SecretCacheItem {
    secret_id: String,
    client: Arc<dyn SecretStore>,
    config: Arc<SecretCacheConfig>,
    /// Serializes refresh and read for this item, independent of the store
    /// locks; at most one describe call is in flight per secret.
    state: Mutex<ItemState>,
    /// Cached versions of this secret; its own lock domain.
    versions: LruCache<String, Arc<SecretCacheVersion>>,
}

struct ItemState {
    machine: RefreshState<SecretDescription>,
    /// Next scheduled TTL refresh, randomized within [TTL/2, TTL] after each
    /// successful refresh. `None` means due.
    next_refresh: Option<Instant>,
}

impl PartialEq for SecretCacheItem {
    fn eq(&self, other: &Self) -> bool {
        self.secret_id == other.secret_id
    }
}

impl Eq for SecretCacheItem {}

impl SecretCacheItem {
    pub fn new(
        secret_id: String,
        client: Arc<dyn SecretStore>,
        config: Arc<SecretCacheConfig>,
    ) -> Self {
        Self {
            secret_id,
            client,
            config,
            state: Mutex::new(ItemState {
                machine: RefreshState::new(),
                next_refresh: None,
            }),
            versions: LruCache::new(VERSION_CACHE_SIZE),
        }
    }

    /// Extends the base refresh check with the item TTL: a healthy item is
    /// also due once its scheduled refresh time has passed.
    fn is_refresh_needed(&self, state: &ItemState, now: Instant) -> bool {
        if state.machine.is_refresh_needed(now) {
            return true;
        }
        if state.machine.pending_error().is_some() {
            return false;
        }
        match state.next_refresh {
            Some(at) => now >= at,
            None => true,
        }
    }

    async fn refresh(&self, state: &mut ItemState) {
        if !self.is_refresh_needed(state, Instant::now()) {
            return;
        }
        state.machine.begin_refresh();
        match self.client.describe_secret(&self.secret_id).await {
            Ok(description) => {
                let ttl_ms = self.config.cache_item_ttl.as_millis() as u64;
                let wait_ms = rand::thread_rng().gen_range(ttl_ms / 2..=ttl_ms);
                state.next_refresh = Some(Instant::now() + Duration::from_millis(wait_ms));
                debug!(secret_id = %self.secret_id, "refreshed secret metadata");
                state
                    .machine
                    .record_success(description, self.config.cache_hook.as_deref());
            }
            Err(err) => {
                let wait = state.machine.record_failure(err.clone(), Instant::now());
                warn!(
                    secret_id = %self.secret_id,
                    error = %err,
                    retry_in = ?wait,
                    "secret metadata refresh failed"
                );
            }
        }
    }

    /// Resolve the version entry carrying the configured stage, creating it
    /// in the nested version store on first use.
    fn resolve_version(&self, description: &SecretDescription) -> Option<Arc<SecretCacheVersion>> {
        let stages = description.version_ids_to_stages.as_ref()?;
        let version_id = stages
            .iter()
            .find(|(_, labels)| labels.iter().any(|label| *label == self.config.version_stage))
            .map(|(version_id, _)| version_id.clone())?;
        if let Some(version) = self.versions.get(&version_id) {
            return Some(version);
        }
        let created = Arc::new(SecretCacheVersion::new(
            self.secret_id.clone(),
            version_id.clone(),
            self.client.clone(),
            self.config.clone(),
        ));
        self.versions.put_if_absent(version_id.clone(), created.clone());
        Some(self.versions.get(&version_id).unwrap_or(created))
    }

    /// Return the secret value for the currently staged version, refreshing
    /// the metadata first if needed.
    ///
    /// Absent metadata or no version carrying the configured stage yields
    /// `None`, not an error; the value fetch is skipped entirely in that
    /// case.
    pub async fn get_secret_value(&self) -> Result<Option<SecretValue>, CacheError> {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await;
        let description = match state.machine.cached(self.config.cache_hook.as_deref())? {
            Some(description) => description,
            None => {
                if let Some(err) = state.machine.pending_error() {
                    return Err(err.clone().into());
                }
                return Ok(None);
            }
        };
        let Some(version) = self.resolve_version(&description) else {
            return Ok(None);
        };
        version.get_secret_value().await
    }

    /// Force a refresh of the secret metadata.
    ///
    /// Sleeps a randomized interval first (the larger of the anti-loop
    /// jitter and any remaining backoff wait), then refreshes under the
    /// entry lock. Returns true if the refresh left no pending error.
    /// Dropping the returned future aborts the wait.
    pub async fn refresh_now(&self) -> bool {
        let wait = {
            let mut state = self.state.lock().await;
            state.machine.mark_refresh_needed();
            state.machine.force_refresh_wait(Instant::now())
        };
        tokio::time::sleep(wait).await;

        let mut state = self.state.lock().await;
        self.refresh(&mut state).await;
        state.machine.pending_error().is_none()
    }
}
