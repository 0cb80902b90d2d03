//! Dealer ledger and balance.

use std::sync::Arc;

use tracing::debug;

use crate::models::{DealerBalance, DealerFinance, Transaction};
use crate::store::{Direction, RecordStore, Select};

use super::dealers::Dealers;
use super::{parse_row, parse_rows, require, FetchError};

const TRANSACTIONS_TABLE: &str = "transactions";
const BALANCES_TABLE: &str = "dealer_balances";

#[derive(Clone)]
pub struct Finance {
    store: Arc<dyn RecordStore>,
    dealers: Dealers,
}

impl Finance {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            dealers: Dealers::new(Arc::clone(&store)),
            store,
        }
    }

    /// Fetch a dealer's transaction history and running balance
    /// together. Both parts must exist: a dealer with no balance row
    /// has broken bookkeeping and the whole fetch fails.
    pub async fn for_dealer(&self, dealer_id: &str) -> Result<DealerFinance, FetchError> {
        require("dealer_id", dealer_id)?;

        let (transactions, balance) =
            futures::try_join!(self.transactions(dealer_id), self.balance(dealer_id))?;
        debug!(dealer_id, count = transactions.len(), "Fetched dealer finance");
        Ok(DealerFinance { transactions, balance })
    }

    /// Resolve the signed-in user's dealer, then fetch its finance.
    pub async fn for_user(&self, user_id: &str) -> Result<DealerFinance, FetchError> {
        let dealer = self.dealers.by_user(user_id).await?;
        self.for_dealer(&dealer.id).await
    }

    async fn transactions(&self, dealer_id: &str) -> Result<Vec<Transaction>, FetchError> {
        let query = Select::new(TRANSACTIONS_TABLE)
            .eq("dealer_id", dealer_id)
            .order_by("transaction_date", Direction::Desc);
        let rows = self.store.fetch(&query).await?;
        parse_rows(rows, "transaction")
    }

    async fn balance(&self, dealer_id: &str) -> Result<DealerBalance, FetchError> {
        let query = Select::new(BALANCES_TABLE).eq("dealer_id", dealer_id);
        let row = self
            .store
            .fetch_one(&query)
            .await
            .map_err(|e| FetchError::from_store(e, "Dealer balance"))?;
        parse_row(row, "dealer balance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "transactions",
                vec![
                    json!({
                        "id": "t1", "dealer_id": "d1", "type": "opening_balance",
                        "amount": 500.0, "description": "Opening balance",
                        "transaction_date": "2024-05-01", "reference_id": null,
                        "created_at": "2024-05-01T09:00:00Z"
                    }),
                    json!({
                        "id": "t2", "dealer_id": "d1", "type": "payment",
                        "amount": -200.0, "description": "Cheque 118",
                        "transaction_date": "2024-06-10", "reference_id": null,
                        "created_at": "2024-06-10T09:00:00Z"
                    }),
                ],
            )
            .await;
        store
            .seed(
                "dealer_balances",
                vec![json!({
                    "dealer_id": "d1",
                    "balance": 300.0,
                    "last_transaction_date": "2024-06-10"
                })],
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_finance_combines_ledger_and_balance() {
        let store = seeded().await;
        let finance = Finance::new(store as Arc<dyn RecordStore>);

        let result = finance.for_dealer("d1").await.expect("fetch failed");
        assert_eq!(result.balance.balance, dec!(300.00));
        assert_eq!(result.transactions.len(), 2);
        // Newest first.
        assert_eq!(result.transactions[0].id, "t2");
        assert_eq!(result.transactions[0].kind, TransactionKind::Payment);
        assert_eq!(result.transactions[1].kind, TransactionKind::OpeningBalance);
    }

    #[tokio::test]
    async fn test_missing_balance_row_fails_the_whole_fetch() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "transactions",
                vec![json!({
                    "id": "t1", "dealer_id": "d9", "type": "order",
                    "amount": 50.0, "description": null,
                    "transaction_date": "2024-06-01", "reference_id": "o1",
                    "created_at": "2024-06-01T09:00:00Z"
                })],
            )
            .await;
        let finance = Finance::new(store as Arc<dyn RecordStore>);

        let err = finance.for_dealer("d9").await.expect_err("must fail");
        assert!(matches!(err, FetchError::NotFound("Dealer balance")));
    }
}
