use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::handlers::import_export::{export_products, import_products, import_template};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

const MAX_CSV_BYTES: usize = 10 * 1024 * 1024;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/export/products", get(export_products))
        .route("/import/template", get(import_template))
        .route(
            "/import/products",
            post(import_products).layer(DefaultBodyLimit::max(MAX_CSV_BYTES)),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
