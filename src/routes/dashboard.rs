use axum::{routing::get, Router};
use crate::handlers::dashboard::get_dashboard;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
