//! Router tests that run without a live database.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storefront_server::config::{Config, DB_HOST, DB_NAME, DB_PORT};
use storefront_server::db::connect_options;
use storefront_server::{app, AppState};
use tower::ServiceExt;

/// State whose pool points at a closed port and never connects up front.
fn unreachable_state() -> AppState {
    let pairs = [(DB_NAME, "shop"), (DB_HOST, "127.0.0.1"), (DB_PORT, "1")];
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::resolve(&env).unwrap();

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy_with(connect_options(&config));

    AppState {
        pool,
        config: Arc::new(config),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_responds_without_database() {
    let response = app(unreachable_state())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Storefront API");
}

#[tokio::test]
async fn health_reports_unavailable_database() {
    let response = app(unreachable_state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Database unavailable");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let response = app(unreachable_state())
        .oneshot(Request::get("/products").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["details"], "/products");
}
