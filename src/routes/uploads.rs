use axum::{extract::DefaultBodyLimit, routing::post, Router};
use crate::handlers::upload::{upload_image, MAX_IMAGE_BYTES};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    // Leave headroom for the multipart framing around a maximum-size image
    Router::new()
        .route(
            "/uploads/images",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024)),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}
