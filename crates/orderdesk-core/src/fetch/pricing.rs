//! Price chart and catalog lookups.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::models::{PriceChart, PriceChartItem};
use crate::store::{Direction, RecordStore, Select};

use super::{parse_row, parse_rows, require, FetchError};

const CHARTS_TABLE: &str = "price_charts";
const ITEMS_TABLE: &str = "price_chart_items";
const PRODUCTS_TABLE: &str = "products";

#[derive(Clone)]
pub struct Pricing {
    store: Arc<dyn RecordStore>,
}

impl Pricing {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve a price chart by code or primary key.
    ///
    /// Dealer records carry the chart code, so the unique code column
    /// is tried first; an unmatched code falls back to an id lookup.
    pub async fn chart(&self, id_or_code: &str) -> Result<PriceChart, FetchError> {
        require("chart_id", id_or_code)?;

        let by_code = Select::new(CHARTS_TABLE).eq("code", id_or_code);
        match self.store.fetch_one(&by_code).await {
            Ok(row) => return parse_row(row, "price chart"),
            Err(e) if e.is_no_rows() => {}
            Err(e) => return Err(FetchError::Remote(e.message)),
        }

        let by_id = Select::new(CHARTS_TABLE).eq("id", id_or_code);
        let row = self
            .store
            .fetch_one(&by_id)
            .await
            .map_err(|e| FetchError::from_store(e, "Price chart"))?;
        parse_row(row, "price chart")
    }

    /// Fetch the chart's items currently in force, most recent first,
    /// with product details joined in.
    ///
    /// Zero active items fails with [`FetchError::NoActiveItems`]: the
    /// product listing derives from this result, so a chart with no
    /// live prices has nothing a dealer can order.
    pub async fn active_items(&self, chart_id: &str) -> Result<Vec<PriceChartItem>, FetchError> {
        require("chart_id", chart_id)?;

        let query = Select::new(ITEMS_TABLE)
            .embed("product", PRODUCTS_TABLE, "product_id")
            .eq("chart_id", chart_id)
            .is_null("expiry_date")
            .order_by("effective_date", Direction::Desc);

        let rows = self.store.fetch(&query).await?;
        if rows.is_empty() {
            return Err(FetchError::NoActiveItems);
        }

        let rows: Vec<ItemRow> = parse_rows(rows, "price chart item")?;
        debug!(chart_id = chart_id, count = rows.len(), "Active items fetched");
        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }
}

// Raw row shape: item columns plus the embedded product.

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: String,
    chart_id: String,
    product_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    currency: String,
    effective_date: NaiveDate,
    #[serde(default)]
    expiry_date: Option<NaiveDate>,
    product: ProductRow,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    name: String,
    category: String,
    unit: String,
}

impl ItemRow {
    fn into_item(self) -> PriceChartItem {
        PriceChartItem {
            id: self.id,
            chart_id: self.chart_id,
            product_id: self.product_id,
            product_name: self.product.name,
            category: self.product.category,
            unit: self.product.unit,
            unit_price: self.unit_price,
            currency: self.currency,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "price_charts",
                vec![json!({"id": "pc-1", "name": "Standard", "code": "PC1"})],
            )
            .await;
        store
            .seed(
                "products",
                vec![json!({
                    "id": "p1",
                    "name": "Widget",
                    "category": "hardware",
                    "unit": "piece"
                })],
            )
            .await;
        store
            .seed(
                "price_chart_items",
                vec![
                    json!({
                        "id": "i1",
                        "chart_id": "pc-1",
                        "product_id": "p1",
                        "unit_price": 9.0,
                        "currency": "USD",
                        "effective_date": "2024-01-01",
                        "expiry_date": "2024-05-01"
                    }),
                    json!({
                        "id": "i2",
                        "chart_id": "pc-1",
                        "product_id": "p1",
                        "unit_price": 10.0,
                        "currency": "USD",
                        "effective_date": "2024-06-01",
                        "expiry_date": null
                    }),
                ],
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_chart_resolves_by_code_then_id() {
        let pricing = Pricing::new(seeded().await);

        let by_code = pricing.chart("PC1").await.expect("code lookup failed");
        assert_eq!(by_code.id, "pc-1");

        let by_id = pricing.chart("pc-1").await.expect("id lookup failed");
        assert_eq!(by_id.code, "PC1");

        let err = pricing.chart("missing").await.expect_err("must fail");
        assert!(matches!(err, FetchError::NotFound("Price chart")));
    }

    #[tokio::test]
    async fn test_active_items_excludes_superseded_prices() {
        let pricing = Pricing::new(seeded().await);

        let items = pricing.active_items("pc-1").await.expect("fetch failed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "i2");
        assert_eq!(items[0].unit_price, dec!(10.00));
        assert_eq!(items[0].product_name, "Widget");
        assert!(items[0].is_active());
    }

    #[tokio::test]
    async fn test_chart_with_no_active_items_is_a_hard_failure() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "price_charts",
                vec![json!({"id": "pc-2", "name": "Retired", "code": "PC2"})],
            )
            .await;

        let pricing = Pricing::new(store);
        let err = pricing.active_items("pc-2").await.expect_err("must fail");
        assert!(matches!(err, FetchError::NoActiveItems));
        assert_eq!(err.to_string(), "No active items on this price chart");
    }
}
