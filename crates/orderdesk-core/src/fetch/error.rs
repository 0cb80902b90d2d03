use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the entity fetchers.
///
/// Every variant carries a message fit for direct display; none carry
/// retry hints. Cache faults never appear here; the cache layer logs
/// and swallows them.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Input contract violation, raised before any network effect.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Zero rows where exactly one was required.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The price chart has no items currently in force. A hard
    /// failure: a dealer whose chart has gone dark cannot order, which
    /// is not the same as an empty-but-valid product list.
    #[error("No active items on this price chart")]
    NoActiveItems,

    /// Backing-store fault, message passed through verbatim.
    #[error("{0}")]
    Remote(String),
}

impl FetchError {
    /// Map a single-row store fault, turning the no-rows code into the
    /// domain `NotFound` for the named entity.
    pub(crate) fn from_store(err: StoreError, entity: &'static str) -> Self {
        if err.is_no_rows() {
            FetchError::NotFound(entity)
        } else {
            FetchError::Remote(err.message)
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        FetchError::Remote(err.message)
    }
}
