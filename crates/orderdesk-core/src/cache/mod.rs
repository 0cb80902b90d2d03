//! Cache-backed fetching.
//!
//! - [`entry`] - a cached payload with its fetch timestamp and staleness check
//! - [`store`] - key/value persistence behind the [`CacheStore`] trait
//! - [`facade`] - [`CachedQuery`], the read-through cache around a fetcher
//! - [`refresh`] - periodic background refresh tied to the validity window

pub mod entry;
pub mod facade;
pub mod refresh;
pub mod store;

pub use entry::{CacheEntry, CacheState, VALIDITY_WINDOW_MINUTES};
pub use facade::CachedQuery;
pub use refresh::{spawn_refresh, RefreshHandle};
pub use store::{CacheStore, FileStore, MemoryCache};
