//! Storefront Server - configuration, database bootstrap and HTTP entry point.
//!
//! ## Modules
//!
//! - `config` - environment-driven configuration with `.env` layering
//! - `db` - PostgreSQL pool, startup migration gate and schema reconciliation
//! - `routes` - HTTP routes (health probe)
//! - `error` - HTTP error responses

pub mod config;
pub mod db;
pub mod error;
pub mod routes;

use crate::config::Config;
use crate::db::Pool;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
