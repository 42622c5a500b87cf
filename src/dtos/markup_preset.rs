use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

use crate::dtos::non_empty;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct MarkupPresetRequest {
    pub preset_name: Option<String>,
    pub markup_percentage: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug)]
pub struct ValidMarkupPreset {
    pub preset_name: String,
    pub markup_percentage: f64,
    pub is_default: bool,
}

impl MarkupPresetRequest {
    pub fn validate(self) -> Result<ValidMarkupPreset, AppError> {
        let preset_name = non_empty(self.preset_name)
            .ok_or_else(|| AppError::validation("Preset name is required"))?;
        let markup_percentage = self
            .markup_percentage
            .filter(|m| m.is_finite() && *m >= 0.0)
            .ok_or_else(|| AppError::validation("Markup percentage must be 0 or greater"))?;
        Ok(ValidMarkupPreset {
            preset_name,
            markup_percentage,
            is_default: self.is_default,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MarkupPresetResponse {
    pub id: i64,
    pub preset_name: String,
    pub markup_percentage: f64,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}

impl From<crate::models::markup_preset::MarkupPreset> for MarkupPresetResponse {
    fn from(preset: crate::models::markup_preset::MarkupPreset) -> Self {
        Self {
            id: preset.id,
            preset_name: preset.preset_name,
            markup_percentage: preset.markup_percentage,
            is_default: preset.is_default,
            created_at: preset.created_at,
        }
    }
}
