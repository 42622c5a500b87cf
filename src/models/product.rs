use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: i64,
    pub vendor_id: Option<i64>,
    pub vendor_name: Option<String>,
    pub product_name: String,
    pub actual_price: f64,
    pub markup_percentage: f64,
    pub selling_price: f64,
    pub profit: f64,
    pub quantity: i64,
    pub total_profit: f64,
    pub product_url: Option<String>,
    pub product_image: Option<String>,
    pub notes: Option<String>,
    pub date_added: NaiveDate,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Product columns joined with the owning vendor's name. Callers append the WHERE clause.
pub const PRODUCT_SELECT: &str = "SELECT p.id, p.vendor_id, v.vendor_name,
        p.product_name, p.actual_price, p.markup_percentage, p.selling_price,
        p.profit, p.quantity, p.total_profit, p.product_url, p.product_image,
        p.notes, p.date_added, p.status, p.created_at, p.updated_at
     FROM products p
     LEFT JOIN vendors v ON p.vendor_id = v.id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Active,
    Sold,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Sold => "sold",
            ProductStatus::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "sold" => Ok(ProductStatus::Sold),
            "discontinued" => Ok(ProductStatus::Discontinued),
            other => Err(format!("Invalid status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Active".parse::<ProductStatus>(), Ok(ProductStatus::Active));
        assert_eq!(" sold ".parse::<ProductStatus>(), Ok(ProductStatus::Sold));
        assert!("archived".parse::<ProductStatus>().is_err());
    }
}
