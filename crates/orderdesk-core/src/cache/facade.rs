//! Read-through cache around a fetcher.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::fetch::FetchError;

use super::entry::{CacheEntry, CacheState};
use super::store::CacheStore;

/// The payload key plus this suffix holds the fetch timestamp, as
/// epoch milliseconds.
const FETCHED_AT_SUFFIX: &str = ".fetched_at";

/// A cache key bound to a payload type.
///
/// `load` serves the stored payload while it is inside the validity
/// window and refetches otherwise. Loads on one key are serialized:
/// when a manual refresh and an interval refresh collide, the second
/// waits for the first and then sees the entry it just wrote.
///
/// Storage faults never surface. A failed read counts as a miss and a
/// failed write leaves the previous entry in place; only the fetcher's
/// own errors reach the caller.
pub struct CachedQuery<T> {
    key: &'static str,
    store: Arc<dyn CacheStore>,
    gate: Mutex<()>,
    /// Bumped by `invalidate` and `clear`. A load captures it before
    /// fetching and records its result only if it still holds.
    version: AtomicU64,
    /// The version the stored entry was recorded under; the entry is
    /// trusted only while this matches `version`.
    written: AtomicU64,
    _payload: PhantomData<fn() -> T>,
}

impl<T> CachedQuery<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(key: &'static str, store: Arc<dyn CacheStore>) -> Self {
        Self {
            key,
            store,
            gate: Mutex::new(()),
            version: AtomicU64::new(0),
            written: AtomicU64::new(0),
            _payload: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Return the cached payload if it is valid, otherwise run `fetch`
    /// and store its result. `force_refresh` skips the validity check.
    ///
    /// A failed fetch propagates its error and leaves the previous
    /// entry untouched, so the last-known-good payload stays
    /// retrievable through [`cached`](Self::cached) or a later `load`.
    pub async fn load<F, Fut>(&self, force_refresh: bool, fetch: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let _guard = self.gate.lock().await;

        let version = self.version.load(Ordering::SeqCst);
        let bypass = force_refresh || version != self.written.load(Ordering::SeqCst);
        if !bypass {
            if let Some(entry) = self.read_entry().await {
                if !entry.is_stale() {
                    debug!(key = self.key, "Cache hit");
                    return Ok(entry.payload);
                }
            }
        }

        let payload = fetch().await?;
        // An invalidation or purge landing while the fetch was in
        // flight outdates it: hand the payload to the caller but do
        // not record it, so the next load fetches again. A failed
        // fetch records nothing either, so a pending invalidation
        // keeps bypassing the cache.
        if self.version.load(Ordering::SeqCst) == version {
            self.write_entry(&payload).await;
            self.written.store(version, Ordering::SeqCst);
        }
        Ok(payload)
    }

    /// Force the next `load` to refetch regardless of entry age. A
    /// load whose fetch is already in flight does not count against
    /// it: that result is served to its caller but not recorded.
    pub fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
        debug!(key = self.key, "Cache invalidated");
    }

    /// The stored entry, whatever its age. This is the read path for
    /// showing last-known-good data next to a failed refresh.
    pub async fn cached(&self) -> Option<CacheEntry<T>> {
        self.read_entry().await
    }

    pub async fn state(&self) -> CacheState {
        match self.read_entry().await {
            Some(entry) => entry.state(),
            None => CacheState::Empty,
        }
    }

    /// Drop the stored entry entirely. Used when cached data must not
    /// outlive its owner, e.g. on sign-out.
    pub async fn clear(&self) {
        for key in [self.key.to_string(), self.timestamp_key()] {
            if let Err(e) = self.store.remove(&key).await {
                warn!(key = %key, error = %e, "Failed to clear cache entry");
            }
        }
        // A purge outdates in-flight fetches the same way an
        // invalidation does; their results must not be written back.
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    async fn read_entry(&self) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = self.key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };
        let fetched_at = match self.store.get(&self.timestamp_key()).await {
            Ok(Some(millis)) => parse_timestamp(&millis),
            Ok(None) => None,
            Err(e) => {
                warn!(key = self.key, error = %e, "Cache timestamp read failed, treating as miss");
                None
            }
        }?;
        match serde_json::from_str(&raw) {
            Ok(payload) => Some(CacheEntry::with_timestamp(payload, fetched_at)),
            Err(e) => {
                warn!(key = self.key, error = %e, "Cache entry unreadable, treating as miss");
                None
            }
        }
    }

    async fn write_entry(&self, payload: &T) {
        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        // Payload before the timestamp that vouches for it.
        if let Err(e) = self.store.put(self.key, &raw).await {
            warn!(key = self.key, error = %e, "Cache write failed");
            return;
        }
        let millis = Utc::now().timestamp_millis().to_string();
        if let Err(e) = self.store.put(&self.timestamp_key(), &millis).await {
            warn!(key = self.key, error = %e, "Cache timestamp write failed");
        }
    }

    fn timestamp_key(&self) -> String {
        format!("{}{}", self.key, FETCHED_AT_SUFFIX)
    }
}

fn parse_timestamp(millis: &str) -> Option<DateTime<Utc>> {
    millis
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
