use axum::{extract::State, Json, Extension};
use tracing::instrument;

use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::dashboard::{ActivityItem, DashboardResponse, ProductStats, SalesStats, VendorStats};
use crate::middleware::auth::AuthContext;

const RECENT_PER_KIND: i64 = 5;
const RECENT_ACTIVITY_LIMIT: usize = 10;

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn get_dashboard(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<DashboardResponse>, AppError> {
    let product_stats = sqlx::query_as::<_, ProductStats>(
        "SELECT COUNT(*) AS total_products,
                COUNT(CASE WHEN status = 'active' THEN 1 END) AS active_products,
                COUNT(CASE WHEN status = 'sold' THEN 1 END) AS sold_products,
                COUNT(CASE WHEN status = 'discontinued' THEN 1 END) AS discontinued_products,
                TOTAL(actual_price * quantity) AS total_investment,
                TOTAL(total_profit) AS total_potential_profit,
                COALESCE(AVG(markup_percentage), 0.0) AS avg_markup_percentage
         FROM products
         WHERE user_id = $1"
    )
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    let sales_stats = sqlx::query_as::<_, SalesStats>(
        "SELECT COUNT(*) AS total_sales,
                COALESCE(SUM(quantity_sold), 0) AS total_items_sold,
                TOTAL(actual_profit) AS total_profit,
                COALESCE(AVG(actual_profit), 0.0) AS avg_profit_per_sale,
                TOTAL(sale_price * quantity_sold) AS total_revenue
         FROM sales
         WHERE user_id = $1"
    )
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    let (total_vendors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vendors WHERE user_id = $1")
        .bind(auth.user_id)
        .fetch_one(&db_pool)
        .await?;

    let mut recent_activity = sqlx::query_as::<_, ActivityItem>(
        "SELECT 'product' AS kind, product_name AS name, created_at AS date
         FROM products
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2"
    )
    .bind(auth.user_id)
    .bind(RECENT_PER_KIND)
    .fetch_all(&db_pool)
    .await?;

    let recent_sales = sqlx::query_as::<_, ActivityItem>(
        "SELECT 'sale' AS kind, p.product_name AS name, s.created_at AS date
         FROM sales s
         JOIN products p ON s.product_id = p.id
         WHERE s.user_id = $1
         ORDER BY s.created_at DESC, s.id DESC
         LIMIT $2"
    )
    .bind(auth.user_id)
    .bind(RECENT_PER_KIND)
    .fetch_all(&db_pool)
    .await?;

    recent_activity.extend(recent_sales);
    recent_activity.sort_by(|a, b| b.date.cmp(&a.date));
    recent_activity.truncate(RECENT_ACTIVITY_LIMIT);

    Ok(Json(DashboardResponse {
        product_stats,
        sales_stats,
        vendor_stats: VendorStats { total_vendors },
        recent_activity,
    }))
}
