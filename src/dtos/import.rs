use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub imported_count: usize,
    pub errors: Vec<String>,
}

/// One line of the products CSV export.
#[derive(Debug, sqlx::FromRow)]
pub struct ProductExportRow {
    pub product_name: String,
    pub vendor_name: Option<String>,
    pub actual_price: f64,
    pub markup_percentage: f64,
    pub selling_price: f64,
    pub quantity: i64,
    pub total_profit: f64,
    pub product_url: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub date_added: NaiveDate,
}
