// src/main.rs
mod routes;
mod handlers;
mod models;
mod database;
mod middleware;
mod state;
mod dtos;
mod error;
mod extract;
mod auth;
mod config;
mod pricing;
#[cfg(test)]
mod test_utils;

use tracing_subscriber::EnvFilter;
use tokio::net::TcpListener;
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};

use crate::config::Config;

/// How many ports past the configured one to try before giving up.
const PORT_FALLBACK_RANGE: u16 = 20;

/// Binds the first free port in `port..=port + PORT_FALLBACK_RANGE`.
async fn bind_first_free(host: IpAddr, port: u16) -> Option<(TcpListener, SocketAddr)> {
    for offset in 0..=PORT_FALLBACK_RANGE {
        let addr = SocketAddr::from((host, port.saturating_add(offset)));
        match TcpListener::bind(addr).await {
            Ok(listener) => return Some((listener, addr)),
            Err(e) if offset == 0 => tracing::warn!(%addr, error = %e, "Port in use, trying next"),
            Err(_) => {}
        }
    }
    None
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("markup_ledger=info,tower_http=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    // Create database pool
    let db_pool = match database::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, url = %config.database_url, "Failed to open database");
            return;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(config.uploads_root()).await {
        tracing::error!(error = %e, dir = %config.uploads_root().display(), "Cannot create upload directory");
        return;
    }

    let (host, base_port) = (config.host, config.port);
    let app_state = state::AppState::new(db_pool, config);
    let app = routes::create_app(app_state);

    let Some((listener, addr)) = bind_first_free(host, base_port).await else {
        tracing::error!(%host, base_port, "No free port in range");
        return;
    };
    tracing::info!(%addr, "Server running");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}
