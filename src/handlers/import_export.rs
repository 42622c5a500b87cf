// src/handlers/import_export.rs
use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Local, NaiveDate};
use csv::StringRecord;
use sqlx::SqlitePool;
use tracing::{error, info, instrument, warn};

use crate::dtos::import::{ImportResponse, ProductExportRow};
use crate::dtos::product::{ProductRequest, ValidProduct};
use crate::error::AppError;
use crate::handlers::product::insert_product;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

const EXPORT_HEADER: [&str; 11] = [
    "Product Name",
    "Vendor Name",
    "Actual Price",
    "Markup Percentage",
    "Selling Price",
    "Quantity",
    "Total Profit",
    "Product URL",
    "Notes",
    "Status",
    "Date Added",
];

/// Column order accepted by the importer.
const TEMPLATE_HEADER: [&str; 9] = [
    "Product Name",
    "Vendor Name",
    "Actual Price",
    "Markup Percentage",
    "Quantity",
    "Product URL",
    "Notes",
    "Status",
    "Date Added",
];

fn csv_attachment(filename: &str, body: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        body,
    )
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV flush failed: {e}")))
}

// GET /export/products
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn export_products(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ProductExportRow>(
        "SELECT p.product_name, v.vendor_name, p.actual_price, p.markup_percentage,
                p.selling_price, p.quantity, p.total_profit, p.product_url, p.notes,
                p.status, p.date_added
         FROM products p
         LEFT JOIN vendors v ON p.vendor_id = v.id
         WHERE p.user_id = $1
         ORDER BY p.date_added DESC, p.id DESC"
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
    for row in &rows {
        writer.write_record([
            row.product_name.clone(),
            row.vendor_name.clone().unwrap_or_default(),
            format!("{:.2}", row.actual_price),
            row.markup_percentage.to_string(),
            format!("{:.2}", row.selling_price),
            row.quantity.to_string(),
            format!("{:.2}", row.total_profit),
            row.product_url.clone().unwrap_or_default(),
            row.notes.clone().unwrap_or_default(),
            row.status.clone(),
            row.date_added.to_string(),
        ])?;
    }
    let body = finish(writer)?;

    info!(count = rows.len(), "Products exported");
    let filename = format!("products_export_{}.csv", Local::now().format("%Y-%m-%d_%H-%M-%S"));
    Ok(csv_attachment(&filename, body))
}

// GET /import/template
pub async fn import_template() -> Result<impl IntoResponse, AppError> {
    let today = Local::now().date_naive().to_string();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_HEADER)?;
    writer.write_record([
        "Sample Product",
        "Sample Vendor",
        "100.00",
        "25",
        "1",
        "https://example.com",
        "Sample notes",
        "active",
        today.as_str(),
    ])?;
    Ok(csv_attachment("import_template.csv", finish(writer)?))
}

/// A CSV row that passed validation, with its vendor still identified by name.
#[derive(Debug)]
pub(crate) struct ImportRow {
    pub vendor_name: Option<String>,
    pub product: ValidProduct,
}

fn cell(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Maps one CSV record (in template column order) onto a validated product.
pub(crate) fn parse_row(record: &StringRecord, today: NaiveDate) -> Result<ImportRow, String> {
    if record.len() < 4 {
        return Err("Insufficient data".to_string());
    }

    let product_name = cell(record, 0);
    let actual_price = cell(record, 2)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0);
    if product_name.is_none() || actual_price.is_none() {
        return Err("Invalid product name or price".to_string());
    }

    let markup_percentage = cell(record, 3).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
    let quantity = cell(record, 4)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(1)
        .max(1);
    let date_added = match cell(record, 8) {
        None => None,
        Some(raw) => Some(
            raw.parse::<NaiveDate>()
                .map_err(|_| format!("Invalid date '{raw}'"))?,
        ),
    };

    let request = ProductRequest {
        product_name,
        actual_price,
        markup_percentage: Some(markup_percentage),
        quantity: Some(quantity),
        product_url: cell(record, 5),
        notes: cell(record, 6),
        status: cell(record, 7),
        date_added,
        ..Default::default()
    };
    let product = request.validate(today).map_err(|e| e.to_string())?;

    Ok(ImportRow { vendor_name: cell(record, 1), product })
}

/// Looks a vendor up by exact name, creating it on first sight.
async fn find_or_create_vendor(db_pool: &SqlitePool, user_id: i64, vendor_name: &str) -> Result<i64, AppError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM vendors WHERE user_id = $1 AND vendor_name = $2")
        .bind(user_id)
        .bind(vendor_name)
        .fetch_optional(db_pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (i64,) = sqlx::query_as("INSERT INTO vendors (user_id, vendor_name) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(vendor_name)
        .fetch_one(db_pool)
        .await?;
    info!(vendor_id = id, "Vendor created during import");
    Ok(id)
}

async fn import_row(db_pool: &SqlitePool, user_id: i64, row: ImportRow) -> Result<(), AppError> {
    let mut product = row.product;
    if let Some(name) = row.vendor_name {
        product.vendor_id = Some(find_or_create_vendor(db_pool, user_id, &name).await?);
    }
    insert_product(db_pool, user_id, &product).await?;
    Ok(())
}

/// Client-facing reason for a parsed row that could not be stored.
fn save_failure(line: usize, err: AppError) -> String {
    match err {
        AppError::ValidationError(msg) => msg,
        other => {
            error!(line, error = %other, "Failed to store imported row");
            "could not save product".to_string()
        }
    }
}

// POST /import/products - multipart field `csv_file`
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn import_products(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("csv_file") {
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let upload = upload.ok_or_else(|| AppError::validation("No file uploaded or upload error"))?;

    let today = Local::now().date_naive();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(upload.as_ref());

    let mut imported_count = 0;
    let mut errors = Vec::new();

    // Line numbers count the header as line 1.
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 2;
        let outcome = match record {
            Ok(record) => match parse_row(&record, today) {
                Ok(row) => import_row(&db_pool, auth.user_id, row)
                    .await
                    .map_err(|e| save_failure(line, e)),
                Err(msg) => Err(msg),
            },
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(()) => imported_count += 1,
            Err(msg) => errors.push(format!("Line {line}: {msg}")),
        }
    }

    if !errors.is_empty() {
        warn!(failed = errors.len(), "Some rows were not imported");
    }
    info!(imported_count, "Import completed");

    Ok(Json(ImportResponse {
        success: true,
        message: "Import completed".to_string(),
        imported_count,
        errors,
    }))
}
