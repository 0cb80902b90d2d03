//! Order history and submission.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::models::{Dealer, Order, OrderStatus, PriceChart, PriceChartItem};
use crate::store::{Direction, Embed, RecordStore, Select};

use super::dealers::Dealers;
use super::{parse_row, parse_rows, require, FetchError};

const ORDERS_TABLE: &str = "orders";

/// A candidate order, built from the catalog the dealer is looking at.
///
/// [`OrderDraft::new`] is the one place the line total is computed, so
/// the total shown before submission and the total validated at
/// submission cannot drift apart. Fields stay public for inspection;
/// a hand-assembled draft goes through the same validation.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub dealer_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub price_chart_id: String,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

impl OrderDraft {
    pub fn new(
        dealer: &Dealer,
        chart: &PriceChart,
        item: &PriceChartItem,
        quantity: Decimal,
        notes: Option<String>,
    ) -> Self {
        Self {
            dealer_id: dealer.id.clone(),
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            unit: item.unit.clone(),
            quantity,
            price_chart_id: chart.id.clone(),
            price_per_unit: item.unit_price,
            total_price: quantity * item.unit_price,
            notes,
        }
    }
}

/// Check a draft's required fields and numeric invariants. Fields are
/// checked in a fixed order and the first violation is the one
/// reported; nothing reaches the store on failure.
fn validate(draft: &OrderDraft) -> Result<(), FetchError> {
    require("dealer_id", &draft.dealer_id)?;
    require("product_id", &draft.product_id)?;
    require("product_name", &draft.product_name)?;
    require("unit", &draft.unit)?;
    positive("quantity", draft.quantity)?;
    positive("price_per_unit", draft.price_per_unit)?;
    positive("total_price", draft.total_price)?;

    let expected = draft.quantity * draft.price_per_unit;
    if draft.total_price != expected {
        return Err(FetchError::Validation {
            field: "total_price",
            message: format!(
                "total price {} does not equal {} x {}",
                draft.total_price, draft.quantity, draft.price_per_unit
            ),
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: Decimal) -> Result<(), FetchError> {
    if value <= Decimal::ZERO {
        return Err(FetchError::Validation {
            field,
            message: format!("{} must be greater than zero", field.replace('_', " ")),
        });
    }
    Ok(())
}

/// Wire shape of an order insert. The store assigns id and creation
/// timestamp; status always starts at `processing`.
#[derive(Serialize)]
struct NewOrderRow<'a> {
    dealer_id: &'a str,
    salesperson_id: Option<&'a str>,
    product_id: &'a str,
    product_name: &'a str,
    unit: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    quantity: Decimal,
    price_chart_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price_per_unit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
    status: OrderStatus,
    notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct Orders {
    store: Arc<dyn RecordStore>,
    dealers: Dealers,
}

impl Orders {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            dealers: Dealers::new(Arc::clone(&store)),
            store,
        }
    }

    /// Fetch a dealer's order history, newest first. An empty history
    /// is a valid result.
    pub async fn for_dealer(&self, dealer_id: &str) -> Result<Vec<Order>, FetchError> {
        require("dealer_id", dealer_id)?;

        let query = Select::new(ORDERS_TABLE)
            .eq("dealer_id", dealer_id)
            .order_by("created_at", Direction::Desc);
        let rows = self.store.fetch(&query).await?;
        parse_rows(rows, "order")
    }

    /// Validate and submit a new order, returning it fully
    /// materialized with dealer, salesperson, and product joined in.
    ///
    /// The dealer row is re-read so the salesperson denormalized onto
    /// the order is the current assignment, not whatever the caller
    /// had cached.
    pub async fn create(&self, draft: &OrderDraft) -> Result<Order, FetchError> {
        validate(draft)?;

        let dealer = self.dealers.by_id(&draft.dealer_id).await?;

        let row = NewOrderRow {
            dealer_id: &draft.dealer_id,
            salesperson_id: dealer.salesperson_id.as_deref(),
            product_id: &draft.product_id,
            product_name: &draft.product_name,
            unit: &draft.unit,
            quantity: draft.quantity,
            price_chart_id: &draft.price_chart_id,
            price_per_unit: draft.price_per_unit,
            total_price: draft.total_price,
            status: OrderStatus::Processing,
            notes: draft.notes.as_deref(),
        };
        let row = serde_json::to_value(&row)
            .map_err(|e| FetchError::Remote(format!("Failed to encode order payload: {}", e)))?;

        let returning = [
            Embed::new("dealer", "dealers", "dealer_id"),
            Embed::new("salesperson", "salespersons", "salesperson_id"),
            Embed::new("product", "products", "product_id"),
        ];
        let created = self.store.insert(ORDERS_TABLE, &row, &returning).await?;

        let order: Order = parse_row(created, "created order")?;
        info!(order_id = %order.id, dealer_id = %order.dealer_id, total = %order.total_price, "Order submitted");
        Ok(order)
    }
}
