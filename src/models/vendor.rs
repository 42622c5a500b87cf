use chrono::NaiveDateTime;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Vendor {
    pub id: i64,
    pub vendor_name: String,
    pub contact_info: Option<String>,
    pub created_at: NaiveDateTime,
    pub product_count: i64,
}

/// Columns selected for every vendor read, with the owned product count.
pub const VENDOR_SELECT: &str = "SELECT v.id, v.vendor_name, v.contact_info, v.created_at,
        (SELECT COUNT(*) FROM products p WHERE p.vendor_id = v.id) AS product_count
     FROM vendors v";
