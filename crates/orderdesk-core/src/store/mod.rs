//! Record store access.
//!
//! The backing store is a hosted relational database exposed over a
//! PostgREST-style interface. This module keeps that dialect behind a
//! small query surface: filtered selects, single-row selects, and
//! insert-with-returning, with rows travelling as raw JSON until the
//! fetchers type them.
//!
//! Two implementations are provided:
//! - [`RestStore`]: the real HTTP client.
//! - [`MemoryStore`]: an in-process table map with the same query
//!   semantics, used by tests and fixtures.

pub mod error;
pub mod memory;
pub mod query;
pub mod rest;

pub use error::{StoreError, NO_ROWS_CODE};
pub use memory::MemoryStore;
pub use query::{Direction, Embed, Filter, Select};
pub use rest::RestStore;

use async_trait::async_trait;
use serde_json::Value;

/// Query interface to the hosted record store.
///
/// All row data is owned by the store; callers hold advisory copies
/// only. Errors carry the store's own message so it can be shown to
/// the user unchanged.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a select and return all matching rows.
    async fn fetch(&self, query: &Select) -> Result<Vec<Value>, StoreError>;

    /// Run a select that must match exactly one row.
    ///
    /// Zero (or more than one) matching rows fail with the store's
    /// no-rows code, which fetchers map to a domain `NotFound`.
    async fn fetch_one(&self, query: &Select) -> Result<Value, StoreError>;

    /// Insert a row and return its stored representation with the given
    /// relations embedded. The store assigns the row's identifier and
    /// creation timestamp.
    async fn insert(
        &self,
        table: &str,
        row: &Value,
        returning: &[Embed],
    ) -> Result<Value, StoreError>;
}
