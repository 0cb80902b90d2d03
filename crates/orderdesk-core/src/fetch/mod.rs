//! Entity fetchers.
//!
//! Each fetcher wraps the record store for one domain: it rejects
//! missing input identifiers before any remote call, runs the store
//! queries, and types the raw rows into domain records. Fetchers
//! perform no local mutation; they are projections over remote state.
//!
//! - [`Dealers`]: the signed-in user's dealer account
//! - [`Pricing`]: chart resolution and active catalog items
//! - [`Orders`]: order history and validated submission
//! - [`Finance`]: ledger and balance, fetched together

pub mod dealers;
pub mod error;
pub mod finance;
pub mod orders;
pub mod pricing;

pub use dealers::Dealers;
pub use error::FetchError;
pub use finance::Finance;
pub use orders::{Orders, OrderDraft};
pub use pricing::Pricing;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Reject an empty required identifier before any remote call.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), FetchError> {
    if value.trim().is_empty() {
        return Err(FetchError::Validation {
            field,
            message: format!("{} is required", field.replace('_', " ")),
        });
    }
    Ok(())
}

/// Type a raw store row, reporting a malformed one as a store fault.
pub(crate) fn parse_row<T: DeserializeOwned>(row: Value, what: &str) -> Result<T, FetchError> {
    serde_json::from_value(row)
        .map_err(|e| FetchError::Remote(format!("Failed to parse {} row: {}", what, e)))
}

pub(crate) fn parse_rows<T: DeserializeOwned>(
    rows: Vec<Value>,
    what: &str,
) -> Result<Vec<T>, FetchError> {
    rows.into_iter().map(|row| parse_row(row, what)).collect()
}
