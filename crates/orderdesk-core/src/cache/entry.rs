//! A cached payload and its age.

use chrono::{DateTime, Duration, Utc};

/// How long a cached payload is served without refetching. The
/// background refresh interval matches this, so a cache kept warm by
/// [`spawn_refresh`](crate::cache::spawn_refresh) flips to stale right
/// as the next refresh lands.
pub const VALIDITY_WINDOW_MINUTES: i64 = 5;

/// What a cache key currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing stored, or the stored bytes could not be read back.
    Empty,
    /// Stored and inside the validity window.
    Valid,
    /// Stored but past the validity window; served only when a
    /// refetch fails.
    Stale,
}

/// A payload together with when it was fetched.
///
/// Not serialized as a unit: the store keeps the payload and the
/// timestamp under separate keys so either can be inspected without
/// decoding the other.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_timestamp(payload: T, fetched_at: DateTime<Utc>) -> Self {
        Self { payload, fetched_at }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// A payload exactly at the window boundary counts as stale.
    pub fn is_stale(&self) -> bool {
        self.age() >= Duration::minutes(VALIDITY_WINDOW_MINUTES)
    }

    pub fn state(&self) -> CacheState {
        if self.is_stale() {
            CacheState::Stale
        } else {
            CacheState::Valid
        }
    }
}
