use serde::{Deserialize, Serialize};

/// A customer account entitled to place orders against a price chart.
///
/// Read-only from the client; dealer onboarding and salesperson
/// assignment happen on the operations side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dealer {
    pub id: String,
    pub name: String,
    pub code: String,
    /// Salesperson currently responsible for this account, if any.
    #[serde(default)]
    pub salesperson_id: Option<String>,
    /// Code of the price chart this dealer orders against. A dealer
    /// without one cannot see a catalog.
    #[serde(default)]
    pub price_chart_code: Option<String>,
}

/// Salesperson assigned to a dealer, as embedded on created orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesperson {
    pub id: String,
    pub name: String,
}
