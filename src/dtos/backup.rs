// Backup file layout. Records keep their original ids so restore can remap
// foreign keys; every optional column defaults so hand-edited or older files
// still load.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile {
    pub created_at: NaiveDateTime,
    pub user_id: i64,
    pub data: BackupData,
}

/// What restore and the listing need from a backup; the envelope fields are optional.
#[derive(Debug, Deserialize)]
pub struct BackupContents {
    pub data: BackupData,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub vendors: Vec<VendorRecord>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub markup_presets: Vec<MarkupPresetRecord>,
}

impl BackupData {
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            vendors: self.vendors.len(),
            products: self.products.len(),
            sales: self.sales.len(),
            markup_presets: self.markup_presets.len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct VendorRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub vendor_name: String,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

fn default_quantity() -> i64 {
    1
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub vendor_id: Option<i64>,
    pub product_name: String,
    pub actual_price: f64,
    #[serde(default)]
    pub markup_percentage: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub date_added: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SaleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub product_id: i64,
    pub quantity_sold: i64,
    pub sale_price: f64,
    pub actual_profit: f64,
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarkupPresetRecord {
    pub preset_name: String,
    pub markup_percentage: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub vendors: usize,
    pub products: usize,
    pub sales: usize,
    pub markup_presets: usize,
}

#[derive(Debug, Serialize)]
pub struct BackupCreatedResponse {
    pub success: bool,
    pub filename: String,
    pub records: RecordCounts,
}

#[derive(Debug, Serialize)]
pub struct BackupListItem {
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub info: Option<RecordCounts>,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub success: bool,
    pub restored: RecordCounts,
    pub skipped_sales: usize,
}
