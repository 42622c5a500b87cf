use axum::{extract::{Multipart, State}, http::StatusCode, Extension, Json};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dtos::upload::UploadResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// File extension for each accepted image content type.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

// POST /uploads/images - multipart field `image`
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn upload_image(
    State(AppState { config, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            image = Some((content_type, field.bytes().await?));
            break;
        }
    }
    let (content_type, bytes) = image.ok_or_else(|| AppError::validation("No image uploaded or upload error"))?;

    let extension = image_extension(&content_type).ok_or_else(|| {
        AppError::validation("Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.")
    })?;
    if bytes.is_empty() {
        return Err(AppError::validation("No image uploaded or upload error"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::validation("File too large. Maximum size is 5MB."));
    }

    let dir = config.uploads_dir(auth.user_id);
    tokio::fs::create_dir_all(&dir).await?;
    let filename = format!("product_{}_{}.{extension}", Utc::now().timestamp(), Uuid::new_v4().simple());
    tokio::fs::write(dir.join(&filename), &bytes).await?;

    info!(%filename, size = bytes.len(), "Image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            message: "Image uploaded successfully".to_string(),
            image_url: format!("/uploads/user_{}/{filename}", auth.user_id),
            filename,
        }),
    ))
}
