use axum::{routing::{get, put}, Router};
use crate::handlers::markup_preset::{create_preset, delete_preset, list_presets, update_preset};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/markup-presets", get(list_presets).post(create_preset))
        .route("/markup-presets/{id}", put(update_preset).delete(delete_preset))
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
