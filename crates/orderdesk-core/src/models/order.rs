use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dealer::{Dealer, Salesperson};
use super::pricing::Product;

/// Order lifecycle. The client creates orders in `Processing`; later
/// transitions are operational and only ever observed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

/// A submitted order. Product name and unit are denormalized at
/// creation time so history stays readable after charts change; the
/// salesperson is the one assigned to the dealer when the order was
/// placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub dealer_id: String,
    #[serde(default)]
    pub salesperson_id: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub price_chart_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_unit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,

    // Joined summaries, present when the row was read with embeds
    // (the create path always returns them).
    #[serde(default)]
    pub dealer: Option<Dealer>,
    #[serde(default)]
    pub salesperson: Option<Salesperson>,
    #[serde(default)]
    pub product: Option<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_row_deserializes_without_embeds() {
        let row = serde_json::json!({
            "id": "orders-1",
            "dealer_id": "d1",
            "salesperson_id": null,
            "product_id": "p1",
            "product_name": "Widget",
            "unit": "piece",
            "quantity": 5.0,
            "price_chart_id": "pc-1",
            "price_per_unit": 20.0,
            "total_price": 100.0,
            "status": "processing",
            "notes": null,
            "created_at": "2024-06-10T08:30:00Z"
        });

        let order: Order = serde_json::from_value(row).expect("Failed to parse order row");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total_price, dec!(100.00));
        assert!(order.dealer.is_none());
        assert!(order.salesperson.is_none());
    }

    #[test]
    fn test_status_round_trips_lowercase() {
        let status: OrderStatus = serde_json::from_str("\"canceled\"").expect("bad status");
        assert_eq!(status, OrderStatus::Canceled);
        assert_eq!(serde_json::to_string(&status).expect("encode"), "\"canceled\"");
        assert_eq!(status.label(), "Canceled");
    }
}
