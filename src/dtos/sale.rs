use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime};

use crate::dtos::{blank_date, lenient_id, non_empty};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub product_id: Option<i64>,
    pub quantity_sold: Option<i64>,
    pub sale_price: Option<f64>,
    #[serde(default, deserialize_with = "blank_date")]
    pub sale_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Decrement the product's stock. Defaults to true.
    pub update_inventory: Option<bool>,
}

#[derive(Debug)]
pub struct ValidSale {
    pub product_id: i64,
    pub quantity_sold: i64,
    pub sale_price: f64,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub update_inventory: bool,
}

impl CreateSaleRequest {
    pub fn validate(self, today: NaiveDate) -> Result<ValidSale, AppError> {
        let mut errors = Vec::new();

        let product_id = match self.product_id {
            None => {
                errors.push("Product ID is missing");
                0
            }
            Some(id) if id <= 0 => {
                errors.push("Product ID must be a positive number");
                0
            }
            Some(id) => id,
        };
        let quantity_sold = check_quantity(self.quantity_sold, &mut errors);
        let sale_price = check_price(self.sale_price, &mut errors);

        if !errors.is_empty() {
            return Err(AppError::validation(format!("Validation failed: {}", errors.join(", "))));
        }

        Ok(ValidSale {
            product_id,
            quantity_sold,
            sale_price,
            sale_date: self.sale_date.unwrap_or(today),
            notes: non_empty(self.notes),
            update_inventory: self.update_inventory.unwrap_or(true),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSaleRequest {
    pub quantity_sold: Option<i64>,
    pub sale_price: Option<f64>,
    #[serde(default, deserialize_with = "blank_date")]
    pub sale_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct ValidSaleUpdate {
    pub quantity_sold: i64,
    pub sale_price: f64,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
}

impl UpdateSaleRequest {
    pub fn validate(self, today: NaiveDate) -> Result<ValidSaleUpdate, AppError> {
        let mut errors = Vec::new();
        let quantity_sold = check_quantity(self.quantity_sold, &mut errors);
        let sale_price = check_price(self.sale_price, &mut errors);

        if !errors.is_empty() {
            return Err(AppError::validation(format!("Validation failed: {}", errors.join(", "))));
        }

        Ok(ValidSaleUpdate {
            quantity_sold,
            sale_price,
            sale_date: self.sale_date.unwrap_or(today),
            notes: non_empty(self.notes),
        })
    }
}

fn check_quantity(value: Option<i64>, errors: &mut Vec<&'static str>) -> i64 {
    match value {
        None => {
            errors.push("Quantity sold is missing");
            0
        }
        Some(q) if q <= 0 => {
            errors.push("Quantity sold must be greater than 0");
            0
        }
        Some(q) => q,
    }
}

fn check_price(value: Option<f64>, errors: &mut Vec<&'static str>) -> f64 {
    match value {
        None => {
            errors.push("Sale price is missing");
            0.0
        }
        Some(p) if !p.is_finite() || p <= 0.0 => {
            errors.push("Sale price must be greater than 0");
            0.0
        }
        Some(p) => p,
    }
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub vendor_name: String,
    pub quantity_sold: i64,
    pub sale_price: f64,
    pub actual_price: f64,
    pub selling_price: f64,
    pub actual_profit: f64,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<crate::models::sale::Sale> for SaleResponse {
    fn from(sale: crate::models::sale::Sale) -> Self {
        Self {
            id: sale.id,
            product_id: sale.product_id,
            product_name: sale.product_name,
            vendor_name: sale.vendor_name,
            quantity_sold: sale.quantity_sold,
            sale_price: sale.sale_price,
            actual_price: sale.actual_price,
            selling_price: sale.selling_price,
            actual_profit: sale.actual_profit,
            sale_date: sale.sale_date,
            notes: sale.notes,
            created_at: sale.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleRecordedResponse {
    pub sale: SaleResponse,
    pub inventory_updated: bool,
    pub remaining_quantity: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OverallSalesStats {
    pub total_sales: i64,
    pub total_items_sold: i64,
    pub total_profit: f64,
    pub avg_profit_per_sale: f64,
    pub first_sale_date: Option<String>,
    pub last_sale_date: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MonthlySalesStats {
    pub month: i64,
    pub sales_count: i64,
    pub monthly_profit: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub product_name: String,
    pub total_sold: i64,
    pub total_profit: f64,
}

#[derive(Debug, Serialize)]
pub struct SalesStatsResponse {
    pub overall_stats: OverallSalesStats,
    pub monthly_stats: Vec<MonthlySalesStats>,
    pub top_products: Vec<TopProduct>,
}
