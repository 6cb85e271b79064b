//! Refresh/backoff state machine shared by cache entries
//!
//! Every cache entry owns a [`RefreshState`] guarded by the entry's own
//! mutex. The state moves between three situations: fresh (cached data, no
//! refresh needed), stale (refresh needed on next read) and backoff (the last
//! refresh failed and retries wait for `next_retry`).

use std::marker::PhantomData;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::error::{CacheError, StoreError};
use crate::hook::{CachedValue, SecretCacheHook};

/// Base delay in milliseconds after a failed refresh.
const EXCEPTION_BACKOFF_MS: u64 = 1000;

/// Maximum delay in milliseconds before retrying a failed refresh.
const BACKOFF_PLATEAU_MS: u64 = EXCEPTION_BACKOFF_MS * 128;

/// Upper bound in milliseconds for the randomized sleep performed by a
/// forced refresh. The sleep discourages callers from forcing refreshes in
/// a tight loop.
const FORCE_REFRESH_JITTER_MS: u64 = 5000;

/// Un-jittered retry delay for the given consecutive failure count.
fn backoff_delay_ms(err_count: u32) -> u64 {
    let factor = 1u64.checked_shl(err_count).unwrap_or(u64::MAX);
    EXCEPTION_BACKOFF_MS
        .saturating_add(EXCEPTION_BACKOFF_MS.saturating_mul(factor))
        .min(BACKOFF_PLATEAU_MS)
}

/// Refresh state for a single cache entry holding a value of type `T`.
///
/// The value is stored as a [`CachedValue`] so a configured hook can swap in
/// its own representation; `T` conversions happen on the way in and out.
pub(crate) struct RefreshState<T> {
    /// Set at construction and by forced refreshes
    refresh_needed: bool,
    /// Result of the last successful refresh, possibly hook-transformed
    data: Option<CachedValue>,
    /// Failure of the last refresh, re-surfaced to readers while no data
    /// exists
    err: Option<StoreError>,
    /// Consecutive failures since the last success; the backoff exponent
    err_count: u32,
    /// Earliest time a failed entry may be refreshed again
    next_retry: Option<Instant>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RefreshState<T>
where
    T: Into<CachedValue> + TryFrom<CachedValue, Error = CacheError>,
{
    pub fn new() -> Self {
        Self {
            refresh_needed: true,
            data: None,
            err: None,
            err_count: 0,
            next_retry: None,
            _marker: PhantomData,
        }
    }

    /// Whether the entry should refresh at `now`.
    ///
    /// True when a refresh was requested, or when the last refresh failed
    /// and the backoff wait has elapsed. A failed entry within its backoff
    /// window reports false so readers do not hammer the store.
    pub fn is_refresh_needed(&self, now: Instant) -> bool {
        if self.refresh_needed {
            return true;
        }
        if self.err.is_some() {
            return match self.next_retry {
                Some(at) => now >= at,
                None => true,
            };
        }
        false
    }

    /// Clear the refresh flag before running the refresh action.
    pub fn begin_refresh(&mut self) {
        self.refresh_needed = false;
    }

    /// Request a refresh on the next read.
    pub fn mark_refresh_needed(&mut self) {
        self.refresh_needed = true;
    }

    /// Record a successful refresh, storing the result through the hook.
    pub fn record_success(&mut self, result: T, hook: Option<&dyn SecretCacheHook>) {
        let value = result.into();
        self.data = Some(match hook {
            Some(hook) => hook.store(value),
            None => value,
        });
        self.err = None;
        self.err_count = 0;
    }

    /// Record a failed refresh and schedule the next retry.
    ///
    /// The retry delay grows exponentially from the base delay up to the
    /// plateau, with uniform jitter drawn from [delay/2, delay]. The
    /// exponent only increments while the un-jittered delay is still below
    /// the plateau, so both it and the delay are bounded.
    pub fn record_failure(&mut self, err: StoreError, now: Instant) -> Duration {
        let delay_ms = backoff_delay_ms(self.err_count);
        if delay_ms < BACKOFF_PLATEAU_MS {
            self.err_count += 1;
        }
        let wait_ms = rand::thread_rng().gen_range(delay_ms / 2..=delay_ms);
        let wait = Duration::from_millis(wait_ms);
        self.next_retry = Some(now + wait);
        self.err = Some(err);
        wait
    }

    /// The failure recorded by the last refresh, if any.
    pub fn pending_error(&self) -> Option<&StoreError> {
        self.err.as_ref()
    }

    /// The cached result, run back through the hook.
    pub fn cached(&self, hook: Option<&dyn SecretCacheHook>) -> Result<Option<T>, CacheError> {
        let Some(data) = self.data.clone() else {
            return Ok(None);
        };
        let value = match hook {
            Some(hook) => hook.retrieve(data),
            None => data,
        };
        T::try_from(value).map(Some)
    }

    /// How long a forced refresh should sleep before refreshing.
    ///
    /// Always at least the anti-loop jitter; when the entry is in backoff,
    /// the remaining backoff wait if that is longer.
    pub fn force_refresh_wait(&self, now: Instant) -> Duration {
        let jitter_ms = rand::thread_rng()
            .gen_range(FORCE_REFRESH_JITTER_MS / 2..=FORCE_REFRESH_JITTER_MS);
        let jitter = Duration::from_millis(jitter_ms);
        if self.err.is_some() {
            let remaining = self
                .next_retry
                .map(|at| at.saturating_duration_since(now))
                .unwrap_or_default();
            jitter.max(remaining)
        } else {
            jitter
        }
    }
}
