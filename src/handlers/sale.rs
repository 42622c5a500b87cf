use axum::{extract::{Path, State}, Json, Extension};
use axum::http::StatusCode;
use chrono::{Datelike, Local};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::extract::JsonBody;
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::sale::{
    CreateSaleRequest, MonthlySalesStats, OverallSalesStats, SaleRecordedResponse, SaleResponse,
    SalesStatsResponse, TopProduct, UpdateSaleRequest,
};
use crate::dtos::MessageResponse;
use crate::handlers::product::fetch_product;
use crate::middleware::auth::AuthContext;
use crate::models::product::ProductStatus;
use crate::models::sale::{Sale, SALE_SELECT};
use crate::pricing;

async fn fetch_sale(db_pool: &SqlitePool, user_id: i64, id: i64) -> Result<Sale, AppError> {
    sqlx::query_as::<_, Sale>(&format!("{SALE_SELECT} WHERE s.id = $1 AND s.user_id = $2"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))
}

/// Records a sale and, unless the caller opts out, takes the sold units out
/// of the product's stock. Both writes share one transaction.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleRecordedResponse>), AppError> {
    let sale = req.validate(Local::now().date_naive())?;

    let mut tx = db_pool.begin().await?;

    let product = fetch_product(&mut *tx, auth.user_id, sale.product_id).await?;

    if sale.quantity_sold > product.quantity {
        warn!(
            product_id = product.id,
            available = product.quantity,
            requested = sale.quantity_sold,
            "Rejected sale exceeding stock"
        );
        return Err(AppError::validation(format!(
            "Insufficient quantity. Only {} items available",
            product.quantity
        )));
    }

    let actual_profit = pricing::sale_profit(sale.sale_price, product.actual_price, sale.quantity_sold);

    let (sale_id,): (i64,) = sqlx::query_as(
        "INSERT INTO sales (user_id, product_id, quantity_sold, sale_price, actual_profit, sale_date, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id"
    )
    .bind(auth.user_id)
    .bind(product.id)
    .bind(sale.quantity_sold)
    .bind(sale.sale_price)
    .bind(actual_profit)
    .bind(sale.sale_date)
    .bind(&sale.notes)
    .fetch_one(&mut *tx)
    .await?;

    let remaining_quantity = if sale.update_inventory {
        let remaining = product.quantity - sale.quantity_sold;
        let status = if remaining == 0 { ProductStatus::Sold.as_str() } else { product.status.as_str() };

        sqlx::query(
            "UPDATE products
             SET quantity = $1, total_profit = $2, status = $3, updated_at = CURRENT_TIMESTAMP
             WHERE id = $4 AND user_id = $5"
        )
        .bind(remaining)
        .bind(pricing::round_cents(product.profit * remaining as f64))
        .bind(status)
        .bind(product.id)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

        remaining
    } else {
        product.quantity
    };

    tx.commit().await?;
    info!(sale_id, product_id = product.id, remaining_quantity, "Sale recorded");

    let recorded = fetch_sale(&db_pool, auth.user_id, sale_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(SaleRecordedResponse {
            sale: SaleResponse::from(recorded),
            inventory_updated: sale.update_inventory,
            remaining_quantity,
        }),
    ))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_sales(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<SaleResponse>>, AppError> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "{SALE_SELECT} WHERE s.user_id = $1 ORDER BY s.sale_date DESC, s.created_at DESC, s.id DESC"
    ))
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(sales.into_iter().map(SaleResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn get_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale = fetch_sale(&db_pool, auth.user_id, id).await?;
    Ok(Json(SaleResponse::from(sale)))
}

/// Edits the sale record only. Stock levels stay where they are.
#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn update_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let update = req.validate(Local::now().date_naive())?;
    let existing = fetch_sale(&db_pool, auth.user_id, id).await?;

    let actual_profit = pricing::sale_profit(update.sale_price, existing.actual_price, update.quantity_sold);

    sqlx::query(
        "UPDATE sales
         SET quantity_sold = $1, sale_price = $2, actual_profit = $3, sale_date = $4, notes = $5
         WHERE id = $6 AND user_id = $7"
    )
    .bind(update.quantity_sold)
    .bind(update.sale_price)
    .bind(actual_profit)
    .bind(update.sale_date)
    .bind(&update.notes)
    .bind(id)
    .bind(auth.user_id)
    .execute(&db_pool)
    .await?;

    let updated = fetch_sale(&db_pool, auth.user_id, id).await?;
    Ok(Json(SaleResponse::from(updated)))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn delete_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Sale not found"));
    }

    Ok(Json(MessageResponse::ok("Sale deleted successfully")))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn sales_stats(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SalesStatsResponse>, AppError> {
    let overall_stats = sqlx::query_as::<_, OverallSalesStats>(
        "SELECT COUNT(*) AS total_sales,
                COALESCE(SUM(quantity_sold), 0) AS total_items_sold,
                TOTAL(actual_profit) AS total_profit,
                COALESCE(AVG(actual_profit), 0.0) AS avg_profit_per_sale,
                MIN(sale_date) AS first_sale_date,
                MAX(sale_date) AS last_sale_date
         FROM sales
         WHERE user_id = $1"
    )
    .bind(auth.user_id)
    .fetch_one(&db_pool)
    .await?;

    // Months of the current (local) calendar year that have at least one sale
    let year = format!("{:04}", Local::now().year());
    let monthly_stats = sqlx::query_as::<_, MonthlySalesStats>(
        "SELECT CAST(strftime('%m', sale_date) AS INTEGER) AS month,
                COUNT(*) AS sales_count,
                TOTAL(actual_profit) AS monthly_profit
         FROM sales
         WHERE user_id = $1 AND strftime('%Y', sale_date) = $2
         GROUP BY month
         ORDER BY month"
    )
    .bind(auth.user_id)
    .bind(year)
    .fetch_all(&db_pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        "SELECT p.id AS product_id, p.product_name,
                SUM(s.quantity_sold) AS total_sold,
                TOTAL(s.actual_profit) AS total_profit
         FROM sales s
         JOIN products p ON s.product_id = p.id
         WHERE s.user_id = $1
         GROUP BY p.id, p.product_name
         ORDER BY total_sold DESC, total_profit DESC
         LIMIT 10"
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(SalesStatsResponse { overall_stats, monthly_stats, top_products }))
}
