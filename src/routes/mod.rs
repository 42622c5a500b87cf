pub mod auth;
pub mod backups;
pub mod dashboard;
pub mod import_export;
pub mod markup_presets;
pub mod products;
pub mod sales;
pub mod uploads;
pub mod vendors;

use axum::http::{header, Method};
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Every `/api` route. Each module applies the session check to its own
/// protected routes.
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(vendors::routes(state.clone()))
        .merge(sales::routes(state.clone()))
        .merge(markup_presets::routes(state.clone()))
        .merge(dashboard::routes(state.clone()))
        .merge(import_export::routes(state.clone()))
        .merge(backups::routes(state.clone()))
        .merge(uploads::routes(state))
}

/// The complete service: API, health checks, uploaded images and the HTTP layers.
pub fn create_app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.config.uploads_root());

    // Credentialed requests cannot use wildcard CORS, so mirror the caller's origin
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", create_router(state.clone()))
        .route("/", get(|| async { "Markup Ledger API" }))
        .route("/health", get(health_check))
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
