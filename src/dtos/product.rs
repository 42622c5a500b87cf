// src/dtos/product.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dtos::{blank_date, lenient_id, non_empty};
use crate::error::AppError;
use crate::models::product::ProductStatus;

/// Body of `POST /products` and `PUT /products/{id}`. Updates replace every field.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub product_name: Option<String>,
    pub actual_price: Option<f64>,
    pub markup_percentage: Option<f64>,
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub vendor_id: Option<i64>,
    pub product_url: Option<String>,
    pub product_image: Option<String>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    pub date_added: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub struct ValidProduct {
    pub product_name: String,
    pub actual_price: f64,
    pub markup_percentage: f64,
    pub quantity: i64,
    pub vendor_id: Option<i64>,
    pub product_url: Option<String>,
    pub product_image: Option<String>,
    pub notes: Option<String>,
    pub date_added: NaiveDate,
    pub status: ProductStatus,
}

impl ProductRequest {
    pub fn validate(self, today: NaiveDate) -> Result<ValidProduct, AppError> {
        let mut errors = Vec::new();

        let product_name = non_empty(self.product_name);
        if product_name.is_none() {
            errors.push("Product name is required".to_string());
        }

        let actual_price = self.actual_price.filter(|p| p.is_finite() && *p > 0.0);
        if actual_price.is_none() {
            errors.push("Valid actual price is required (must be greater than 0)".to_string());
        }

        let markup_percentage = self.markup_percentage.filter(|m| m.is_finite() && *m >= 0.0);
        if markup_percentage.is_none() {
            errors.push("Valid markup percentage is required (must be 0 or greater)".to_string());
        }

        let quantity = self.quantity.unwrap_or(1);
        if quantity < 1 {
            errors.push("Quantity must be at least 1".to_string());
        }

        let status = match non_empty(self.status) {
            None => ProductStatus::Active,
            Some(raw) => match raw.parse::<ProductStatus>() {
                Ok(status) => status,
                Err(e) => {
                    errors.push(e);
                    ProductStatus::Active
                }
            },
        };

        match (product_name, actual_price, markup_percentage) {
            (Some(product_name), Some(actual_price), Some(markup_percentage)) if errors.is_empty() => {
                Ok(ValidProduct {
                    product_name,
                    actual_price,
                    markup_percentage,
                    quantity,
                    vendor_id: self.vendor_id.filter(|id| *id > 0),
                    product_url: non_empty(self.product_url),
                    product_image: non_empty(self.product_image),
                    notes: non_empty(self.notes),
                    date_added: self.date_added.unwrap_or(today),
                    status,
                })
            }
            _ => Err(AppError::validation(format!("Invalid product data: {}", errors.join(", ")))),
        }
    }
}

/// Query string of `GET /products`. Values that fail to parse are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub status: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_profit: Option<String>,
    pub max_profit: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn parse_opt<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).and_then(|v| v.parse().ok())
}

impl ProductFilters {
    pub fn search(&self) -> Option<String> {
        non_empty(self.search.clone())
    }
    pub fn vendor_id(&self) -> Option<i64> {
        parse_opt(&self.vendor)
    }
    pub fn status(&self) -> Option<ProductStatus> {
        parse_opt(&self.status)
    }
    pub fn min_price(&self) -> Option<f64> {
        parse_opt(&self.min_price)
    }
    pub fn max_price(&self) -> Option<f64> {
        parse_opt(&self.max_price)
    }
    pub fn min_profit(&self) -> Option<f64> {
        parse_opt(&self.min_profit)
    }
    pub fn max_profit(&self) -> Option<f64> {
        parse_opt(&self.max_profit)
    }
    pub fn date_from(&self) -> Option<NaiveDate> {
        parse_opt(&self.date_from)
    }
    pub fn date_to(&self) -> Option<NaiveDate> {
        parse_opt(&self.date_to)
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub product_name: String,
    pub vendor_id: Option<i64>,
    pub vendor_name: Option<String>,
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

// Convert from Model to Response DTO
impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        Self {
            id: product.id,
            product_name: product.product_name,
            vendor_id: product.vendor_id,
            vendor_name: product.vendor_name,
            actual_price: product.actual_price,
            markup_percentage: product.markup_percentage,
            selling_price: product.selling_price,
            profit: product.profit,
            quantity: product.quantity,
            total_profit: product.total_profit,
            product_url: product.product_url,
            product_image: product.product_image,
            notes: product.notes,
            date_added: product.date_added,
            status: product.status,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn valid_request() -> ProductRequest {
        ProductRequest {
            product_name: Some("  Walnut Shelf ".into()),
            actual_price: Some(100.0),
            markup_percentage: Some(25.0),
            ..Default::default()
        }
    }

    #[test]
    fn fills_defaults() {
        let product = valid_request().validate(today()).unwrap();
        assert_eq!(product.product_name, "Walnut Shelf");
        assert_eq!(product.quantity, 1);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.date_added, today());
        assert_eq!(product.vendor_id, None);
    }

    #[test]
    fn rejects_non_positive_price_and_negative_markup() {
        let req = ProductRequest {
            actual_price: Some(0.0),
            markup_percentage: Some(-5.0),
            ..valid_request()
        };
        let err = req.validate(today()).unwrap_err().to_string();
        assert!(err.contains("actual price"));
        assert!(err.contains("markup percentage"));
    }

    #[test]
    fn rejects_missing_name_and_zero_quantity() {
        let req = ProductRequest {
            product_name: Some("   ".into()),
            quantity: Some(0),
            ..valid_request()
        };
        let err = req.validate(today()).unwrap_err().to_string();
        assert!(err.contains("Product name is required"));
        assert!(err.contains("Quantity must be at least 1"));
    }

    #[test]
    fn rejects_unknown_status() {
        let req = ProductRequest { status: Some("archived".into()), ..valid_request() };
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn filters_ignore_unparseable_values() {
        let filters = ProductFilters {
            min_price: Some("abc".into()),
            max_price: Some(" 50 ".into()),
            vendor: Some("".into()),
            date_from: Some("2025-01-01".into()),
            ..Default::default()
        };
        assert_eq!(filters.min_price(), None);
        assert_eq!(filters.max_price(), Some(50.0));
        assert_eq!(filters.vendor_id(), None);
        assert_eq!(filters.date_from(), NaiveDate::from_ymd_opt(2025, 1, 1));
    }
}
