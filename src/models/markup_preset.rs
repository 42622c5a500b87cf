use chrono::NaiveDateTime;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct MarkupPreset {
    pub id: i64,
    pub preset_name: String,
    pub markup_percentage: f64,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}

/// Presets every new account starts with: (name, markup %, is_default).
pub const DEFAULT_PRESETS: [(&str, f64, bool); 4] = [
    ("Low Margin", 10.0, false),
    ("Standard", 25.0, true),
    ("High Margin", 50.0, false),
    ("Premium", 100.0, false),
];
