use chrono::{NaiveDate, NaiveDateTime};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    pub quantity_sold: i64,
    pub sale_price: f64,
    pub actual_profit: f64,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub product_name: String,
    pub actual_price: f64,
    pub selling_price: f64,
    pub vendor_name: String,
}

pub const SALE_SELECT: &str = "SELECT s.id, s.product_id, s.quantity_sold, s.sale_price,
        s.actual_profit, s.sale_date, s.notes, s.created_at,
        p.product_name, p.actual_price, p.selling_price,
        COALESCE(v.vendor_name, 'No Vendor') AS vendor_name
     FROM sales s
     JOIN products p ON s.product_id = p.id
     LEFT JOIN vendors v ON p.vendor_id = v.id";
