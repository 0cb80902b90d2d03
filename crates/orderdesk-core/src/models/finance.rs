use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    OpeningBalance,
    Payment,
    Order,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::OpeningBalance => "Opening balance",
            TransactionKind::Payment => "Payment",
            TransactionKind::Order => "Order",
        }
    }
}

/// One ledger entry. Append-only from the client's perspective; order
/// entries reference the order that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub dealer_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Materialized running balance per dealer. Read-only view; the store
/// maintains it from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerBalance {
    pub dealer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(default)]
    pub last_transaction_date: Option<NaiveDate>,
}

/// What the finance screen renders: the ledger plus the current
/// balance, fetched together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerFinance {
    pub transactions: Vec<Transaction>,
    pub balance: DealerBalance,
}
