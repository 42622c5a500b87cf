use axum::{extract::{Path, State}, Json, Extension};
use axum::http::StatusCode;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::extract::JsonBody;
use crate::state::AppState;
use crate::error::{is_unique_violation, AppError};
use crate::dtos::vendor::{VendorRequest, VendorResponse};
use crate::dtos::MessageResponse;
use crate::middleware::auth::AuthContext;
use crate::models::vendor::{Vendor, VENDOR_SELECT};

const DUPLICATE_VENDOR: &str = "A vendor with this name already exists";

async fn fetch_vendor(db_pool: &SqlitePool, user_id: i64, id: i64) -> Result<Vendor, AppError> {
    sqlx::query_as::<_, Vendor>(&format!("{VENDOR_SELECT} WHERE v.id = $1 AND v.user_id = $2"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Vendor not found"))
}

async fn name_taken(
    db_pool: &SqlitePool,
    user_id: i64,
    vendor_name: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let existing: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM vendors WHERE user_id = $1 AND vendor_name = $2 AND id != $3"
    )
    .bind(user_id)
    .bind(vendor_name)
    .bind(except_id.unwrap_or(0))
    .fetch_optional(db_pool)
    .await?;
    Ok(existing.is_some())
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_vendors(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<VendorResponse>>, AppError> {
    let vendors = sqlx::query_as::<_, Vendor>(
        &format!("{VENDOR_SELECT} WHERE v.user_id = $1 ORDER BY v.vendor_name")
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(vendors.into_iter().map(VendorResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn get_vendor(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<VendorResponse>, AppError> {
    let vendor = fetch_vendor(&db_pool, auth.user_id, id).await?;
    Ok(Json(VendorResponse::from(vendor)))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_vendor(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(payload): JsonBody<VendorRequest>,
) -> Result<(StatusCode, Json<VendorResponse>), AppError> {
    let vendor = payload.validate()?;

    if name_taken(&db_pool, auth.user_id, &vendor.vendor_name, None).await? {
        return Err(AppError::validation(DUPLICATE_VENDOR));
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO vendors (user_id, vendor_name, contact_info) VALUES ($1, $2, $3) RETURNING id"
    )
    .bind(auth.user_id)
    .bind(&vendor.vendor_name)
    .bind(&vendor.contact_info)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            return AppError::validation(DUPLICATE_VENDOR);
        }
        AppError::db(e)
    })?;

    info!(vendor_id = id, "Vendor created");
    let created = fetch_vendor(&db_pool, auth.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(VendorResponse::from(created))))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn update_vendor(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<VendorRequest>,
) -> Result<Json<VendorResponse>, AppError> {
    let vendor = payload.validate()?;

    fetch_vendor(&db_pool, auth.user_id, id).await?;

    if name_taken(&db_pool, auth.user_id, &vendor.vendor_name, Some(id)).await? {
        return Err(AppError::validation(DUPLICATE_VENDOR));
    }

    sqlx::query("UPDATE vendors SET vendor_name = $1, contact_info = $2 WHERE id = $3 AND user_id = $4")
        .bind(&vendor.vendor_name)
        .bind(&vendor.contact_info)
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    let updated = fetch_vendor(&db_pool, auth.user_id, id).await?;
    Ok(Json(VendorResponse::from(updated)))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn delete_vendor(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let vendor = fetch_vendor(&db_pool, auth.user_id, id).await?;

    if vendor.product_count > 0 {
        warn!(vendor_id = id, product_count = vendor.product_count, "Refusing to delete vendor with products");
        return Err(AppError::validation(format!(
            "Cannot delete vendor '{}' because it has {} associated products. Please remove or reassign the products first.",
            vendor.vendor_name, vendor.product_count
        )));
    }

    let result = sqlx::query("DELETE FROM vendors WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Vendor not found"));
    }

    Ok(Json(MessageResponse::ok(format!("Vendor '{}' deleted successfully", vendor.vendor_name))))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_utils::TestApp;

    #[tokio::test]
    async fn create_trims_and_nulls_blank_contact() {
        let app = TestApp::new().await;
        let token = app.login_as("vera").await;

        let (status, body) = app
            .post("/api/vendors", &token, json!({ "vendor_name": "  Acme Supply ", "contact_info": "  " }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["vendor_name"], "Acme Supply");
        assert!(body["contact_info"].is_null());
        assert_eq!(body["product_count"], 0);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_per_user() {
        let app = TestApp::new().await;
        let vera = app.login_as("vera").await;
        let walt = app.login_as("walt").await;
        app.create_vendor(&vera, "Acme").await;

        let (status, body) = app.post("/api/vendors", &vera, json!({ "vendor_name": "Acme" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "A vendor with this name already exists");

        // Another account may reuse the name
        app.create_vendor(&walt, "Acme").await;
    }

    #[tokio::test]
    async fn missing_name_is_rejected() {
        let app = TestApp::new().await;
        let token = app.login_as("vera").await;
        let (status, body) = app.post("/api/vendors", &token, json!({ "contact_info": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Vendor name is required");
    }

    #[tokio::test]
    async fn update_renames_but_not_onto_a_sibling() {
        let app = TestApp::new().await;
        let token = app.login_as("vera").await;
        let acme = app.create_vendor(&token, "Acme").await;
        app.create_vendor(&token, "Globex").await;

        let (status, body) = app
            .put(&format!("/api/vendors/{acme}"), &token, json!({ "vendor_name": "Acme Ltd", "contact_info": "ops@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vendor_name"], "Acme Ltd");
        assert_eq!(body["contact_info"], "ops@acme.test");

        let (status, _) = app
            .put(&format!("/api/vendors/{acme}"), &token, json!({ "vendor_name": "Globex" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_vendor_with_products_fails() {
        let app = TestApp::new().await;
        let token = app.login_as("vera").await;
        let vendor_id = app.create_vendor(&token, "Acme").await;
        app.create_product(
            &token,
            json!({ "product_name": "Anvil", "actual_price": 50.0, "markup_percentage": 20.0, "vendor_id": vendor_id }),
        )
        .await;

        let (status, body) = app.delete(&format!("/api/vendors/{vendor_id}"), &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("has 1 associated products"));

        let (status, body) = app.get(&format!("/api/vendors/{vendor_id}"), &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product_count"], 1);
    }

    #[tokio::test]
    async fn deleting_unused_vendor_succeeds() {
        let app = TestApp::new().await;
        let token = app.login_as("vera").await;
        let vendor_id = app.create_vendor(&token, "Acme").await;

        let (status, body) = app.delete(&format!("/api/vendors/{vendor_id}"), &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Vendor 'Acme' deleted successfully");

        let (status, _) = app.get(&format!("/api/vendors/{vendor_id}"), &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn vendors_are_scoped_to_their_owner() {
        let app = TestApp::new().await;
        let vera = app.login_as("vera").await;
        let walt = app.login_as("walt").await;
        let vendor_id = app.create_vendor(&vera, "Acme").await;

        let (status, _) = app.get(&format!("/api/vendors/{vendor_id}"), &walt).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.delete(&format!("/api/vendors/{vendor_id}"), &walt).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, list) = app.get("/api/vendors", &walt).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
