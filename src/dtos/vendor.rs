use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

use crate::dtos::non_empty;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct VendorRequest {
    pub vendor_name: Option<String>,
    pub contact_info: Option<String>,
}

/// A vendor payload after trimming and required-field checks.
#[derive(Debug)]
pub struct ValidVendor {
    pub vendor_name: String,
    pub contact_info: Option<String>,
}

impl VendorRequest {
    pub fn validate(self) -> Result<ValidVendor, AppError> {
        let vendor_name = non_empty(self.vendor_name)
            .ok_or_else(|| AppError::validation("Vendor name is required"))?;
        Ok(ValidVendor {
            vendor_name,
            contact_info: non_empty(self.contact_info),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub id: i64,
    pub vendor_name: String,
    pub contact_info: Option<String>,
    pub product_count: i64,
    pub created_at: NaiveDateTime,
}

impl From<crate::models::vendor::Vendor> for VendorResponse {
    fn from(vendor: crate::models::vendor::Vendor) -> Self {
        Self {
            id: vendor.id,
            vendor_name: vendor.vendor_name,
            contact_info: vendor.contact_info,
            product_count: vendor.product_count,
            created_at: vendor.created_at,
        }
    }
}
