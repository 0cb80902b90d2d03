//! Dealer account lookups.

use std::sync::Arc;

use tracing::debug;

use crate::models::Dealer;
use crate::store::{RecordStore, Select};

use super::{parse_row, require, FetchError};

/// Store table holding dealer accounts.
const DEALERS_TABLE: &str = "dealers";

#[derive(Clone)]
pub struct Dealers {
    store: Arc<dyn RecordStore>,
}

impl Dealers {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch the dealer account linked to a signed-in user. Every user
    /// of this client maps to exactly one dealer; zero rows means the
    /// account is not provisioned.
    pub async fn by_user(&self, user_id: &str) -> Result<Dealer, FetchError> {
        require("user_id", user_id)?;

        let query = Select::new(DEALERS_TABLE).eq("user_id", user_id);
        let row = self
            .store
            .fetch_one(&query)
            .await
            .map_err(|e| FetchError::from_store(e, "Dealer"))?;

        let dealer: Dealer = parse_row(row, "dealer")?;
        debug!(dealer_id = %dealer.id, "Dealer resolved");
        Ok(dealer)
    }

    /// Fetch a dealer by primary key.
    pub async fn by_id(&self, dealer_id: &str) -> Result<Dealer, FetchError> {
        require("dealer_id", dealer_id)?;

        let query = Select::new(DEALERS_TABLE).eq("id", dealer_id);
        let row = self
            .store
            .fetch_one(&query)
            .await
            .map_err(|e| FetchError::from_store(e, "Dealer"))?;

        parse_row(row, "dealer")
    }
}
