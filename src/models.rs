use serde::{Deserialize, Serialize};

/// One spreadsheet row after cell coercion, before aggregation.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub supplier_id: String,
    pub supplier_name: String,
    pub article_id: String,
    pub article_name: String,
    pub kernsortiment: String,
    pub warengruppe: String,
    pub order_number: String,
    pub date: String,
    pub currency: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price_cents: i64,
}

/// A single order line within an article's history. Field names are part of
/// the JSON contract consumed by the seeding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEntry {
    pub date: String,
    pub quantity: f64,
    pub price: i64,
    pub order_number: String,
}

/// Finalized per-(supplier, article) aggregate as written to the processed
/// JSON file. Prices are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub article_id: String,
    pub article_name: String,
    pub supplier: String,
    pub supplier_id: String,
    pub unit: String,
    pub warengruppe: String,
    pub kernsortiment: String,
    pub order_count: usize,
    pub total_quantity: f64,
    pub last_order_date: String,
    pub first_order_date: String,
    pub avg_price: i64,
    pub last_price: i64,
    pub orders: Vec<OrderEntry>,
}
