use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::handlers::backup::{create_backup, delete_backup, download_backup, list_backups, restore_backup};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

const MAX_BACKUP_BYTES: usize = 50 * 1024 * 1024;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/backups", get(list_backups).post(create_backup))
        .route(
            "/backups/restore",
            post(restore_backup).layer(DefaultBodyLimit::max(MAX_BACKUP_BYTES)),
        )
        .route("/backups/{filename}", get(download_backup).delete(delete_backup))
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
