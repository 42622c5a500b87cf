use axum::{extract::{Path, State}, Json, Extension};
use axum::http::StatusCode;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::extract::JsonBody;
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::markup_preset::{MarkupPresetRequest, MarkupPresetResponse};
use crate::dtos::MessageResponse;
use crate::middleware::auth::AuthContext;
use crate::models::markup_preset::MarkupPreset;

async fn fetch_preset<'e, E>(executor: E, user_id: i64, id: i64) -> Result<MarkupPreset, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, MarkupPreset>(
        "SELECT id, preset_name, markup_percentage, is_default, created_at
         FROM markup_presets
         WHERE id = $1 AND user_id = $2"
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::not_found("Markup preset not found"))
}

// Only one preset per user may be the default.
async fn clear_default(conn: &mut SqliteConnection, user_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE markup_presets SET is_default = 0 WHERE user_id = $1 AND is_default = 1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_presets(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<MarkupPresetResponse>>, AppError> {
    let presets = sqlx::query_as::<_, MarkupPreset>(
        "SELECT id, preset_name, markup_percentage, is_default, created_at
         FROM markup_presets
         WHERE user_id = $1
         ORDER BY markup_percentage, preset_name"
    )
    .bind(auth.user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(presets.into_iter().map(MarkupPresetResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_preset(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(payload): JsonBody<MarkupPresetRequest>,
) -> Result<(StatusCode, Json<MarkupPresetResponse>), AppError> {
    let preset = payload.validate()?;

    let mut tx = db_pool.begin().await?;
    if preset.is_default {
        clear_default(&mut tx, auth.user_id).await?;
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO markup_presets (user_id, preset_name, markup_percentage, is_default)
         VALUES ($1, $2, $3, $4)
         RETURNING id"
    )
    .bind(auth.user_id)
    .bind(&preset.preset_name)
    .bind(preset.markup_percentage)
    .bind(preset.is_default)
    .fetch_one(&mut *tx)
    .await?;

    let created = fetch_preset(&mut *tx, auth.user_id, id).await?;
    tx.commit().await?;

    info!(preset_id = id, "Markup preset created");
    Ok((StatusCode::CREATED, Json(MarkupPresetResponse::from(created))))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn update_preset(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<MarkupPresetRequest>,
) -> Result<Json<MarkupPresetResponse>, AppError> {
    let preset = payload.validate()?;

    let mut tx = db_pool.begin().await?;
    fetch_preset(&mut *tx, auth.user_id, id).await?;

    if preset.is_default {
        clear_default(&mut tx, auth.user_id).await?;
    }

    sqlx::query(
        "UPDATE markup_presets
         SET preset_name = $1, markup_percentage = $2, is_default = $3
         WHERE id = $4 AND user_id = $5"
    )
    .bind(&preset.preset_name)
    .bind(preset.markup_percentage)
    .bind(preset.is_default)
    .bind(id)
    .bind(auth.user_id)
    .execute(&mut *tx)
    .await?;

    let updated = fetch_preset(&mut *tx, auth.user_id, id).await?;
    tx.commit().await?;

    Ok(Json(MarkupPresetResponse::from(updated)))
}

#[instrument(skip_all, fields(user_id = auth.user_id, id = id))]
pub async fn delete_preset(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let result = sqlx::query("DELETE FROM markup_presets WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Markup preset not found"));
    }

    Ok(Json(MessageResponse::ok("Markup preset deleted successfully")))
}
