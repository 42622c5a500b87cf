// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Local;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use crate::extract::JsonBody;
use crate::dtos::product::{ProductFilters, ProductRequest, ProductResponse, ValidProduct};
use crate::dtos::MessageResponse;
use crate::middleware::auth::AuthContext;
use crate::models::product::{Product, PRODUCT_SELECT};
use crate::pricing;
use crate::state::AppState;
use crate::error::AppError;
use tracing::{error, info, instrument};

/// Loads one of the caller's products. Accepts a pool or an open transaction.
pub(crate) async fn fetch_product<'e, E>(executor: E, user_id: i64, id: i64) -> Result<Product, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1 AND p.user_id = $2"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))
}

async fn ensure_vendor_owned(db_pool: &SqlitePool, user_id: i64, vendor_id: Option<i64>) -> Result<(), AppError> {
    let Some(vendor_id) = vendor_id else {
        return Ok(());
    };
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM vendors WHERE id = $1 AND user_id = $2")
        .bind(vendor_id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(AppError::validation("Invalid vendor ID")),
    }
}

// GET /products - List the caller's products, optionally filtered
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn get_products(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_SELECT);
    query.push(" WHERE p.user_id = ").push_bind(auth.user_id);

    if let Some(search) = filters.search() {
        let pattern = format!("%{search}%");
        query
            .push(" AND (p.product_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(p.notes, '') LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(vendor_id) = filters.vendor_id() {
        query.push(" AND p.vendor_id = ").push_bind(vendor_id);
    }
    if let Some(status) = filters.status() {
        query.push(" AND p.status = ").push_bind(status.as_str());
    }
    if let Some(min) = filters.min_price() {
        query.push(" AND p.actual_price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price() {
        query.push(" AND p.actual_price <= ").push_bind(max);
    }
    if let Some(min) = filters.min_profit() {
        query.push(" AND p.total_profit >= ").push_bind(min);
    }
    if let Some(max) = filters.max_profit() {
        query.push(" AND p.total_profit <= ").push_bind(max);
    }
    if let Some(from) = filters.date_from() {
        query.push(" AND p.date_added >= ").push_bind(from);
    }
    if let Some(to) = filters.date_to() {
        query.push(" AND p.date_added <= ").push_bind(to);
    }
    query.push(" ORDER BY p.created_at DESC, p.id DESC");

    match query.build_query_as::<Product>().fetch_all(&db_pool).await {
        Ok(products) => {
            let response = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/{id} - Get single product
#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn get_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = fetch_product(&db_pool, auth.user_id, id).await?;
    Ok(Json(ProductResponse::from(product)))
}

// POST /products - Create new product
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = payload.validate(Local::now().date_naive())?;
    ensure_vendor_owned(&db_pool, auth.user_id, product.vendor_id).await?;

    let id = insert_product(&db_pool, auth.user_id, &product).await?;
    info!(product_id = id, "Product created");

    let created = fetch_product(&db_pool, auth.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(created))))
}

pub(crate) async fn insert_product<'e, E>(executor: E, user_id: i64, product: &ValidProduct) -> Result<i64, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let prices = pricing::breakdown(product.actual_price, product.markup_percentage, product.quantity);
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO products (
            user_id, vendor_id, product_name, actual_price, markup_percentage,
            selling_price, profit, quantity, total_profit, product_url,
            product_image, notes, date_added, status
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING id"
    )
    .bind(user_id)
    .bind(product.vendor_id)
    .bind(&product.product_name)
    .bind(product.actual_price)
    .bind(product.markup_percentage)
    .bind(prices.selling_price)
    .bind(prices.profit)
    .bind(product.quantity)
    .bind(prices.total_profit)
    .bind(&product.product_url)
    .bind(&product.product_image)
    .bind(&product.notes)
    .bind(product.date_added)
    .bind(product.status.as_str())
    .fetch_one(executor)
    .await?;
    Ok(id)
}

// PUT /products/{id} - Replace a product's fields and recompute its prices
#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn update_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = payload.validate(Local::now().date_naive())?;
    ensure_vendor_owned(&db_pool, auth.user_id, product.vendor_id).await?;

    let prices = pricing::breakdown(product.actual_price, product.markup_percentage, product.quantity);
    let result = sqlx::query(
        "UPDATE products
         SET vendor_id = $1, product_name = $2, actual_price = $3, markup_percentage = $4,
             selling_price = $5, profit = $6, quantity = $7, total_profit = $8,
             product_url = $9, product_image = $10, notes = $11, date_added = $12,
             status = $13, updated_at = CURRENT_TIMESTAMP
         WHERE id = $14 AND user_id = $15"
    )
    .bind(product.vendor_id)
    .bind(&product.product_name)
    .bind(product.actual_price)
    .bind(product.markup_percentage)
    .bind(prices.selling_price)
    .bind(prices.profit)
    .bind(product.quantity)
    .bind(prices.total_profit)
    .bind(&product.product_url)
    .bind(&product.product_image)
    .bind(&product.notes)
    .bind(product.date_added)
    .bind(product.status.as_str())
    .bind(id)
    .bind(auth.user_id)
    .execute(&db_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    let updated = fetch_product(&db_pool, auth.user_id, id).await?;
    Ok(Json(ProductResponse::from(updated)))
}

// DELETE /products/{id} - Delete product (its sales go with it)
#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn delete_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(Json(MessageResponse::ok("Product deleted successfully")))
}
