//! Core data layer for a dealer ordering client.
//!
//! Dealers browse their assigned price chart, place orders, and review
//! their ledger against a hosted relational store. This crate is the
//! layer screens compose to do that:
//!
//! - [`store`]: query interface to the hosted record store, with a
//!   REST implementation and an in-memory one for tests and fixtures.
//! - [`models`]: typed domain records (dealers, price charts, orders,
//!   transactions) flattened out of the store's joined rows.
//! - [`fetch`]: entity fetchers that validate inputs, run the store
//!   queries, and map faults into a small error taxonomy; order
//!   submission with its validation rules lives here too.
//! - [`cache`]: the cache-backed fetch façade, with a five-minute
//!   validity window per data domain, manual invalidation, and
//!   interval-driven background refresh.
//! - [`portal`]: the composition handle screens hold, wiring session,
//!   fetchers, and façades together.
//!
//! Authentication, rendering, and navigation are the host app's
//! business; the host signs the user in and publishes the result
//! through a [`session::SessionHandle`].

pub mod cache;
pub mod config;
pub mod fetch;
pub mod models;
pub mod portal;
pub mod session;
pub mod store;

pub use cache::{CacheEntry, CacheState, CachedQuery};
pub use config::Config;
pub use fetch::{FetchError, OrderDraft};
pub use portal::{AutoRefresh, DealerPortal};
pub use session::{Session, SessionHandle};
pub use store::{RecordStore, StoreError};
