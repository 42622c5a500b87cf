use axum::{routing::get, Router};
use crate::handlers::vendor;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/vendors", get(vendor::list_vendors).post(vendor::create_vendor))
        .route(
            "/vendors/{id}",
            get(vendor::get_vendor).put(vendor::update_vendor).delete(vendor::delete_vendor),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
