//! Domain records for the dealer ordering client.
//!
//! Everything here is owned by the remote store; the client holds
//! advisory copies only. The structs mirror stored rows with joined
//! relations flattened out:
//!
//! - `Dealer`, `Salesperson`: the account placing orders and its
//!   assigned contact
//! - `PriceChart`, `PriceChartItem`, `Product`, `Catalog`: what the
//!   dealer may order and at what price
//! - `Order`, `OrderStatus`: submitted orders
//! - `Transaction`, `DealerBalance`, `DealerFinance`: the ledger

pub mod dealer;
pub mod finance;
pub mod order;
pub mod pricing;

pub use dealer::{Dealer, Salesperson};
pub use finance::{DealerBalance, DealerFinance, Transaction, TransactionKind};
pub use order::{Order, OrderStatus};
pub use pricing::{latest_per_product, Catalog, PriceChart, PriceChartItem, Product};
