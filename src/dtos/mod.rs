pub mod backup;
pub mod dashboard;
pub mod import;
pub mod markup_preset;
pub mod product;
pub mod sale;
pub mod upload;
pub mod user;
pub mod vendor;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

/// Trims an optional form value; blank strings become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdOrText {
    Id(i64),
    Text(String),
}

/// Reads an optional id sent either as a number or as a numeric string.
/// `null` and blank strings become `None`.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdOrText::Id(id)) => Ok(Some(id)),
        Some(IdOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid id '{text}'")))
        }
    }
}

/// Reads an optional `YYYY-MM-DD` date; blank strings become `None`.
pub fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(Option::<String>::deserialize(deserializer)?) {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid date '{text}'"))),
    }
}
