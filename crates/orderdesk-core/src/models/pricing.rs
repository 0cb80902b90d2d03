use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named price list. Items carry effective/expiry dates; the chart
/// itself is just the container dealers are assigned to by code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChart {
    pub id: String,
    pub name: String,
    /// Unique code, the reference dealers carry.
    pub code: String,
}

/// A priced product line within a chart, flattened over the product
/// join. An item with no expiry date is currently in force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChartItem {
    pub id: String,
    pub chart_id: String,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub currency: String,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl PriceChartItem {
    pub fn is_active(&self) -> bool {
        self.expiry_date.is_none()
    }

    /// Project the joined product fields back out.
    pub fn product(&self) -> Product {
        Product {
            id: self.product_id.clone(),
            name: self.product_name.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// An orderable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit: String,
}

/// A dealer's resolved chart plus its active items; the one payload
/// the catalog screen renders (product list and prices both derive
/// from it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub chart: PriceChart,
    pub items: Vec<PriceChartItem>,
}

impl Catalog {
    /// Distinct orderable products, priced by their most recent active
    /// item.
    pub fn products(&self) -> Vec<Product> {
        latest_per_product(&self.items)
            .into_iter()
            .map(|item| item.product())
            .collect()
    }

    /// The item an order for `product_id` should be priced against.
    pub fn item_for(&self, product_id: &str) -> Option<&PriceChartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// Keep one item per product: the first seen, which for items ordered
/// by effective date descending is the most recent. A chart should
/// only hold one active item per product, but a stray duplicate must
/// not surface the superseded price.
pub fn latest_per_product(items: &[PriceChartItem]) -> Vec<PriceChartItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.product_id.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: &str, product_id: &str, price: Decimal, effective: &str) -> PriceChartItem {
        PriceChartItem {
            id: id.to_string(),
            chart_id: "pc-1".to_string(),
            product_id: product_id.to_string(),
            product_name: "Widget".to_string(),
            category: "hardware".to_string(),
            unit: "piece".to_string(),
            unit_price: price,
            currency: "USD".to_string(),
            effective_date: effective.parse().expect("bad date literal"),
            expiry_date: None,
        }
    }

    #[test]
    fn test_latest_per_product_keeps_first_seen() {
        // Ordered by effective date descending, as the store returns them.
        let items = vec![
            item("i2", "p1", dec!(10.00), "2024-06-01"),
            item("i1", "p1", dec!(9.00), "2024-01-01"),
            item("i3", "p2", dec!(4.50), "2024-03-01"),
        ];

        let latest = latest_per_product(&items);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, "i2");
        assert_eq!(latest[0].unit_price, dec!(10.00));
        assert_eq!(latest[1].id, "i3");
    }

    #[test]
    fn test_catalog_products_are_distinct() {
        let catalog = Catalog {
            chart: PriceChart {
                id: "pc-1".to_string(),
                name: "Standard".to_string(),
                code: "PC1".to_string(),
            },
            items: vec![
                item("i2", "p1", dec!(10.00), "2024-06-01"),
                item("i1", "p1", dec!(9.00), "2024-01-01"),
            ],
        };

        let products = catalog.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Widget");
        assert_eq!(
            catalog.item_for("p1").map(|i| i.unit_price),
            Some(dec!(10.00))
        );
    }
}
