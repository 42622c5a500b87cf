// src/handlers/backup.rs
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Local, Utc};
use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::dtos::backup::{
    BackupContents, BackupCreatedResponse, BackupData, BackupFile, BackupListItem, MarkupPresetRecord,
    ProductRecord, RecordCounts, RestoreResponse, SaleRecord, VendorRecord,
};
use crate::dtos::markup_preset::MarkupPresetRequest;
use crate::dtos::product::ProductRequest;
use crate::dtos::sale::UpdateSaleRequest;
use crate::dtos::vendor::VendorRequest;
use crate::dtos::MessageResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::pricing;
use crate::state::AppState;

/// Accepts only bare `backup_*.json` names so a request can never leave the
/// caller's backup directory.
pub(crate) fn check_backup_name(filename: &str) -> Result<(), AppError> {
    let valid = filename.len() > "backup_.json".len()
        && filename.starts_with("backup_")
        && filename.ends_with(".json")
        && !filename.contains(['/', '\\'])
        && !filename.contains("..");
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("Invalid backup filename"))
    }
}

fn backup_path(config: &Config, user_id: i64, filename: &str) -> Result<PathBuf, AppError> {
    check_backup_name(filename)?;
    Ok(config.backups_dir(user_id).join(filename))
}

fn not_found_as_404(err: std::io::Error) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        AppError::not_found("Backup file not found")
    } else {
        AppError::Io(err)
    }
}

async fn collect_user_data(conn: &mut SqliteConnection, user_id: i64) -> Result<BackupData, AppError> {
    let vendors = sqlx::query_as::<_, VendorRecord>(
        "SELECT id, vendor_name, contact_info, created_at FROM vendors WHERE user_id = $1 ORDER BY id"
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let products = sqlx::query_as::<_, ProductRecord>(
        "SELECT id, vendor_id, product_name, actual_price, markup_percentage, quantity,
                product_url, product_image, notes, status, date_added, created_at
         FROM products WHERE user_id = $1 ORDER BY id"
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let sales = sqlx::query_as::<_, SaleRecord>(
        "SELECT id, product_id, quantity_sold, sale_price, actual_profit, sale_date, notes, created_at
         FROM sales WHERE user_id = $1 ORDER BY id"
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let markup_presets = sqlx::query_as::<_, MarkupPresetRecord>(
        "SELECT preset_name, markup_percentage, is_default, created_at
         FROM markup_presets WHERE user_id = $1 ORDER BY id"
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(BackupData { vendors, products, sales, markup_presets })
}

// POST /backups
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_backup(
    State(AppState { db_pool, config }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<BackupCreatedResponse>, AppError> {
    // One connection gives the four reads a consistent snapshot.
    let mut tx = db_pool.begin().await?;
    let data = collect_user_data(&mut tx, auth.user_id).await?;
    tx.commit().await?;

    let now = Local::now();
    let backup = BackupFile { created_at: now.naive_local(), user_id: auth.user_id, data };
    let records = backup.data.counts();

    let dir = config.backups_dir(auth.user_id);
    tokio::fs::create_dir_all(&dir).await?;
    let filename = format!("backup_{}.json", now.format("%Y-%m-%d_%H-%M-%S_%3f"));
    tokio::fs::write(dir.join(&filename), serde_json::to_vec_pretty(&backup)?).await?;

    info!(%filename, ?records, "Backup created");
    Ok(Json(BackupCreatedResponse { success: true, filename, records }))
}

async fn describe_backup(path: &FsPath, filename: String) -> Result<BackupListItem, std::io::Error> {
    let metadata = tokio::fs::metadata(path).await?;
    let created: DateTime<Utc> = metadata.modified()?.into();
    let info = match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice::<BackupContents>(&bytes)
            .ok()
            .map(|contents| contents.data.counts()),
        Err(_) => None,
    };
    Ok(BackupListItem { filename, size: metadata.len(), created, info })
}

// GET /backups - newest first
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_backups(
    State(AppState { config, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<BackupListItem>>, AppError> {
    let dir = config.backups_dir(auth.user_id);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => return Err(e.into()),
    };

    let mut backups = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(filename) = entry.file_name().into_string() else {
            continue;
        };
        if check_backup_name(&filename).is_err() {
            continue;
        }
        match describe_backup(&entry.path(), filename).await {
            Ok(item) => backups.push(item),
            Err(e) => warn!(error = %e, "Skipping unreadable backup"),
        }
    }

    backups.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.filename.cmp(&a.filename)));
    Ok(Json(backups))
}

// GET /backups/{filename}
#[instrument(skip_all, fields(user_id = auth.user_id, %filename))]
pub async fn download_backup(
    State(AppState { config, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let path = backup_path(&config, auth.user_id, &filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(not_found_as_404)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    ))
}

// DELETE /backups/{filename}
#[instrument(skip_all, fields(user_id = auth.user_id, %filename))]
pub async fn delete_backup(
    State(AppState { config, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let path = backup_path(&config, auth.user_id, &filename)?;
    tokio::fs::remove_file(&path).await.map_err(not_found_as_404)?;

    info!("Backup deleted");
    Ok(Json(MessageResponse::ok("Backup deleted successfully")))
}

async fn clear_user_data(conn: &mut SqliteConnection, user_id: i64) -> Result<(), AppError> {
    for table in ["sales", "products", "vendors", "markup_presets"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn invalid_backup(what: &str, err: AppError) -> AppError {
    AppError::validation(format!("Invalid backup: {what}: {err}"))
}

/// Writes `data` into the caller's account. Vendor and product ids in the file
/// are remapped to the ids the rows receive here. Sales whose product is not
/// in the file are skipped and counted.
async fn restore_data(
    conn: &mut SqliteConnection,
    user_id: i64,
    data: BackupData,
) -> Result<(RecordCounts, usize), AppError> {
    let today = Local::now().date_naive();
    let mut restored = RecordCounts::default();
    let mut vendor_ids: HashMap<i64, i64> = HashMap::new();
    let mut product_ids: HashMap<i64, i64> = HashMap::new();
    let mut skipped_sales = 0;

    for vendor in data.vendors {
        let old_id = vendor.id;
        let created_at = vendor.created_at;
        let vendor = VendorRequest {
            vendor_name: Some(vendor.vendor_name),
            contact_info: vendor.contact_info,
        }
        .validate()
        .map_err(|e| invalid_backup("vendor", e))?;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM vendors WHERE user_id = $1 AND vendor_name = $2")
            .bind(user_id)
            .bind(&vendor.vendor_name)
            .fetch_optional(&mut *conn)
            .await?;

        let new_id = match existing {
            Some((id,)) => id,
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO vendors (user_id, vendor_name, contact_info, created_at)
                     VALUES ($1, $2, $3, COALESCE($4, CURRENT_TIMESTAMP))
                     RETURNING id"
                )
                .bind(user_id)
                .bind(&vendor.vendor_name)
                .bind(&vendor.contact_info)
                .bind(created_at)
                .fetch_one(&mut *conn)
                .await?;
                restored.vendors += 1;
                id
            }
        };
        if let Some(old_id) = old_id {
            vendor_ids.insert(old_id, new_id);
        }
    }

    for product in data.products {
        let label = format!("product '{}'", product.product_name);
        // Sold-out rows legitimately carry quantity 0.
        if product.quantity < 0 {
            return Err(AppError::validation(format!("Invalid backup: {label} has negative quantity")));
        }
        let (old_id, quantity, created_at) = (product.id, product.quantity, product.created_at);
        let vendor_id = product.vendor_id.and_then(|old| vendor_ids.get(&old).copied());
        let product = ProductRequest {
            product_name: Some(product.product_name),
            actual_price: Some(product.actual_price),
            markup_percentage: Some(product.markup_percentage),
            quantity: None,
            vendor_id: None,
            product_url: product.product_url,
            product_image: product.product_image,
            notes: product.notes,
            date_added: product.date_added,
            status: Some(product.status),
        }
        .validate(today)
        .map_err(|e| invalid_backup(&label, e))?;
        let prices = pricing::breakdown(product.actual_price, product.markup_percentage, quantity);

        let (new_id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (
                user_id, vendor_id, product_name, actual_price, markup_percentage,
                selling_price, profit, quantity, total_profit, product_url,
                product_image, notes, status, date_added, created_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, COALESCE($15, CURRENT_TIMESTAMP))
             RETURNING id"
        )
        .bind(user_id)
        .bind(vendor_id)
        .bind(&product.product_name)
        .bind(product.actual_price)
        .bind(product.markup_percentage)
        .bind(prices.selling_price)
        .bind(prices.profit)
        .bind(quantity)
        .bind(prices.total_profit)
        .bind(&product.product_url)
        .bind(&product.product_image)
        .bind(&product.notes)
        .bind(product.status.as_str())
        .bind(product.date_added)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await?;

        restored.products += 1;
        if let Some(old_id) = old_id {
            product_ids.insert(old_id, new_id);
        }
    }

    for sale in data.sales {
        let Some(&product_id) = product_ids.get(&sale.product_id) else {
            skipped_sales += 1;
            continue;
        };
        let (actual_profit, created_at) = (sale.actual_profit, sale.created_at);
        let label = format!("sale of product {}", sale.product_id);
        let sale = UpdateSaleRequest {
            quantity_sold: Some(sale.quantity_sold),
            sale_price: Some(sale.sale_price),
            sale_date: Some(sale.sale_date),
            notes: sale.notes,
        }
        .validate(today)
        .map_err(|e| invalid_backup(&label, e))?;

        sqlx::query(
            "INSERT INTO sales (
                user_id, product_id, quantity_sold, sale_price, actual_profit, sale_date, notes, created_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, CURRENT_TIMESTAMP))"
        )
        .bind(user_id)
        .bind(product_id)
        .bind(sale.quantity_sold)
        .bind(sale.sale_price)
        .bind(actual_profit)
        .bind(sale.sale_date)
        .bind(&sale.notes)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        restored.sales += 1;
    }

    for preset in data.markup_presets {
        let created_at = preset.created_at;
        let label = format!("markup preset '{}'", preset.preset_name);
        let preset = MarkupPresetRequest {
            preset_name: Some(preset.preset_name),
            markup_percentage: Some(preset.markup_percentage),
            is_default: preset.is_default,
        }
        .validate()
        .map_err(|e| invalid_backup(&label, e))?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM markup_presets WHERE user_id = $1 AND preset_name = $2"
        )
        .bind(user_id)
        .bind(&preset.preset_name)
        .fetch_optional(&mut *conn)
        .await?;
        if existing.is_some() {
            continue;
        }
        if preset.is_default {
            sqlx::query("UPDATE markup_presets SET is_default = 0 WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
        }
        sqlx::query(
            "INSERT INTO markup_presets (user_id, preset_name, markup_percentage, is_default, created_at)
             VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_TIMESTAMP))"
        )
        .bind(user_id)
        .bind(&preset.preset_name)
        .bind(preset.markup_percentage)
        .bind(preset.is_default)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        restored.markup_presets += 1;
    }

    Ok((restored, skipped_sales))
}

// POST /backups/restore - multipart `backup_file`, optional `clear_existing=true`
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn restore_backup(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<RestoreResponse>, AppError> {
    let mut upload = None;
    let mut clear_existing = false;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("backup_file") => upload = Some(field.bytes().await?),
            Some("clear_existing") => clear_existing = field.text().await?.trim() == "true",
            _ => {}
        }
    }
    let upload = upload.ok_or_else(|| AppError::validation("No backup file uploaded"))?;
    let contents: BackupContents = serde_json::from_slice(&upload).map_err(|e| {
        warn!(error = %e, "Rejected backup upload");
        AppError::validation("Invalid backup file format")
    })?;

    let mut tx = db_pool.begin().await?;
    if clear_existing {
        clear_user_data(&mut tx, auth.user_id).await?;
    }
    let (restored, skipped_sales) = restore_data(&mut tx, auth.user_id, contents.data).await?;
    tx.commit().await?;

    info!(?restored, skipped_sales, clear_existing, "Backup restored");
    Ok(Json(RestoreResponse { success: true, restored, skipped_sales }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use crate::test_utils::{multipart_request, Part, TestApp};

    #[test]
    fn backup_names_are_confined() {
        assert!(check_backup_name("backup_2025-01-01_10-00-00_000.json").is_ok());
        assert!(check_backup_name("backup_.json").is_err());
        assert!(check_backup_name("notes.json").is_err());
        assert!(check_backup_name("backup_x.txt").is_err());
        assert!(check_backup_name("backup_../../etc.json").is_err());
        assert!(check_backup_name("backup_a\\b.json").is_err());
    }

    async fn seed(app: &TestApp, token: &str) {
        let vendor_id = app.create_vendor(token, "Acme").await;
        let desk = app
            .create_product(
                token,
                json!({ "product_name": "Desk", "actual_price": 100.0, "markup_percentage": 25.0, "quantity": 3, "vendor_id": vendor_id }),
            )
            .await;
        let (status, _) = app
            .post(
                "/api/sales",
                token,
                json!({ "product_id": desk["id"], "quantity_sold": 1, "sale_price": 130.0, "sale_date": "2025-03-01" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn backup_bytes(app: &TestApp, token: &str) -> (String, Vec<u8>) {
        let (status, created) = app.post("/api/backups", token, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let filename = created["filename"].as_str().unwrap().to_string();

        let req = axum::http::Request::builder()
            .uri(format!("/api/backups/{filename}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(axum::body::Body::empty())
            .unwrap();
        let resp = app.send(req).await;
        assert_eq!(resp.status, StatusCode::OK);
        (filename, resp.body.to_vec())
    }

    async fn restore(app: &TestApp, token: &str, file: &[u8], clear: bool) -> (StatusCode, Value) {
        let clear = if clear { "true" } else { "false" };
        let req = multipart_request(
            "/api/backups/restore",
            token,
            &[
                Part::file("backup_file", "backup.json", "application/json", file),
                Part::text("clear_existing", clear),
            ],
        );
        let resp = app.send(req).await;
        (resp.status, resp.json())
    }

    #[tokio::test]
    async fn create_list_download_delete() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        seed(&app, &token).await;

        let (filename, bytes) = backup_bytes(&app, &token).await;
        let file: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(file["data"]["vendors"][0]["vendor_name"], "Acme");
        assert_eq!(file["data"]["products"][0]["quantity"], 2);
        assert_eq!(file["data"]["markup_presets"].as_array().unwrap().len(), 4);

        let (status, list) = app.get("/api/backups", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["filename"], filename.as_str());
        assert_eq!(list[0]["info"]["products"], 1);
        assert_eq!(list[0]["info"]["sales"], 1);
        assert!(list[0]["size"].as_u64().unwrap() > 0);

        let (status, _) = app.delete(&format!("/api/backups/{filename}"), &token).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.delete(&format!("/api/backups/{filename}"), &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Backup file not found");
        let (_, list) = app.get("/api/backups", &token).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_filenames_are_rejected() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        let (status, _) = app.get("/api/backups/secrets.txt", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.delete("/api/backups/backup_..json", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn backups_are_per_user() {
        let app = TestApp::new().await;
        let bea = app.login_as("bea").await;
        let cal = app.login_as("cal").await;
        let (filename, _) = backup_bytes(&app, &bea).await;

        let (status, _) = app.get(&format!("/api/backups/{filename}"), &cal).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, list) = app.get("/api/backups", &cal).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_into_another_account_remaps_ids() {
        let app = TestApp::new().await;
        let bea = app.login_as("bea").await;
        let cal = app.login_as("cal").await;
        // Shift cal's ids away from bea's
        app.create_vendor(&cal, "Placeholder").await;
        seed(&app, &bea).await;
        let (_, bytes) = backup_bytes(&app, &bea).await;

        let (status, body) = restore(&app, &cal, &bytes, true).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["restored"]["vendors"], 1);
        assert_eq!(body["restored"]["products"], 1);
        assert_eq!(body["restored"]["sales"], 1);
        assert_eq!(body["restored"]["markup_presets"], 4);
        assert_eq!(body["skipped_sales"], 0);

        let (_, vendors) = app.get("/api/vendors", &cal).await;
        assert_eq!(vendors.as_array().unwrap().len(), 1);
        assert_eq!(vendors[0]["vendor_name"], "Acme");
        assert_eq!(vendors[0]["product_count"], 1);

        let (_, products) = app.get("/api/products", &cal).await;
        assert_eq!(products[0]["vendor_name"], "Acme");
        assert_eq!(products[0]["vendor_id"], vendors[0]["id"]);
        assert_eq!(products[0]["selling_price"], 125.0);
        assert_eq!(products[0]["total_profit"], 50.0);

        let (_, sales) = app.get("/api/sales", &cal).await;
        assert_eq!(sales[0]["product_id"], products[0]["id"]);
        assert_eq!(sales[0]["product_name"], "Desk");
        assert_eq!(sales[0]["actual_profit"], 30.0);

        // bea's data is untouched
        let (_, bea_products) = app.get("/api/products", &bea).await;
        assert_eq!(bea_products.as_array().unwrap().len(), 1);
        assert_ne!(bea_products[0]["id"], products[0]["id"]);
    }

    #[tokio::test]
    async fn restore_without_clearing_reuses_vendors_and_skips_orphan_sales() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        app.create_vendor(&token, "Acme").await;

        let file = json!({
            "data": {
                "vendors": [{ "id": 40, "vendor_name": "Acme" }, { "id": 41, "vendor_name": "Globex" }],
                "products": [
                    { "id": 7, "vendor_id": 41, "product_name": "Lamp", "actual_price": 10.0, "markup_percentage": 50.0 },
                    { "id": 8, "vendor_id": 99, "product_name": "Rug", "actual_price": 30.0 }
                ],
                "sales": [
                    { "product_id": 7, "quantity_sold": 1, "sale_price": 15.0, "actual_profit": 5.0, "sale_date": "2025-01-01" },
                    { "product_id": 12, "quantity_sold": 1, "sale_price": 1.0, "actual_profit": 0.0, "sale_date": "2025-01-01" }
                ]
            }
        });
        let (status, body) = restore(&app, &token, file.to_string().as_bytes(), false).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["restored"]["vendors"], 1);
        assert_eq!(body["restored"]["products"], 2);
        assert_eq!(body["restored"]["sales"], 1);
        assert_eq!(body["skipped_sales"], 1);

        let (_, products) = app.get("/api/products", &token).await;
        let rug = products.as_array().unwrap().iter().find(|p| p["product_name"] == "Rug").unwrap();
        assert!(rug["vendor_id"].is_null());
        let lamp = products.as_array().unwrap().iter().find(|p| p["product_name"] == "Lamp").unwrap();
        assert_eq!(lamp["vendor_name"], "Globex");
        assert_eq!(lamp["selling_price"], 15.0);
    }

    #[tokio::test]
    async fn failed_restore_rolls_back() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        seed(&app, &token).await;

        let file = json!({
            "data": {
                "products": [
                    { "id": 1, "product_name": "Fine", "actual_price": 5.0 },
                    { "id": 2, "product_name": "Broken", "actual_price": 5.0, "status": "archived" }
                ]
            }
        });
        let (status, _) = restore(&app, &token, file.to_string().as_bytes(), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, products) = app.get("/api/products", &token).await;
        let products = products.as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["product_name"], "Desk");
    }

    async fn assert_restore_rejected(app: &TestApp, token: &str, file: Value, needle: &str) {
        let (status, body) = restore(app, token, file.to_string().as_bytes(), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Invalid backup: "), "{message}");
        assert!(message.contains(needle), "{message}");

        let (_, products) = app.get("/api/products", token).await;
        let names: Vec<_> = products.as_array().unwrap().iter().map(|p| p["product_name"].clone()).collect();
        assert_eq!(names, vec![json!("Desk")]);
        let (_, sales) = app.get("/api/sales", token).await;
        assert_eq!(sales.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restore_rejects_products_that_fail_validation() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        seed(&app, &token).await;

        let file = json!({
            "data": {
                "products": [
                    { "id": 1, "product_name": "", "actual_price": -5.0, "markup_percentage": -200.0 }
                ]
            }
        });
        assert_restore_rejected(&app, &token, file, "Product name is required").await;

        let file = json!({
            "data": {
                "products": [{ "id": 1, "product_name": "Stool", "actual_price": 0.0, "markup_percentage": 10.0 }]
            }
        });
        assert_restore_rejected(&app, &token, file, "actual price").await;
    }

    #[tokio::test]
    async fn restore_rejects_sales_that_fail_validation() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        seed(&app, &token).await;

        let product = json!({ "id": 1, "product_name": "Stool", "actual_price": 10.0, "markup_percentage": 10.0 });
        let file = json!({
            "data": {
                "products": [product],
                "sales": [{ "product_id": 1, "quantity_sold": 0, "sale_price": 12.0, "actual_profit": 0.0, "sale_date": "2025-01-01" }]
            }
        });
        assert_restore_rejected(&app, &token, file, "Quantity sold must be greater than 0").await;

        let file = json!({
            "data": {
                "products": [product],
                "sales": [{ "product_id": 1, "quantity_sold": 1, "sale_price": -1.0, "actual_profit": 0.0, "sale_date": "2025-01-01" }]
            }
        });
        assert_restore_rejected(&app, &token, file, "Sale price must be greater than 0").await;
    }

    #[tokio::test]
    async fn restore_keeps_sold_out_products() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;

        let file = json!({
            "data": {
                "products": [
                    { "id": 3, "product_name": "Chair", "actual_price": 20.0, "markup_percentage": 50.0, "quantity": 0, "status": "sold" }
                ]
            }
        });
        let (status, body) = restore(&app, &token, file.to_string().as_bytes(), false).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (_, products) = app.get("/api/products", &token).await;
        assert_eq!(products[0]["quantity"], 0);
        assert_eq!(products[0]["status"], "sold");
        assert_eq!(products[0]["total_profit"], 0.0);
    }

    #[tokio::test]
    async fn malformed_upload_is_a_bad_request() {
        let app = TestApp::new().await;
        let token = app.login_as("bea").await;
        let (status, body) = restore(&app, &token, b"{not json", false).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid backup file format");

        let req = multipart_request("/api/backups/restore", &token, &[Part::text("clear_existing", "true")]);
        let resp = app.send(req).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["error"], "No backup file uploaded");
    }
}
