use serde::Serialize;
use chrono::NaiveDateTime;

#[derive(Debug, Default, Serialize, sqlx::FromRow)]
pub struct ProductStats {
    pub total_products: i64,
    pub active_products: i64,
    pub sold_products: i64,
    pub discontinued_products: i64,
    pub total_investment: f64,
    pub total_potential_profit: f64,
    pub avg_markup_percentage: f64,
}

#[derive(Debug, Default, Serialize, sqlx::FromRow)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_items_sold: i64,
    pub total_profit: f64,
    pub avg_profit_per_sale: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct VendorStats {
    pub total_vendors: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub product_stats: ProductStats,
    pub sales_stats: SalesStats,
    pub vendor_stats: VendorStats,
    pub recent_activity: Vec<ActivityItem>,
}
