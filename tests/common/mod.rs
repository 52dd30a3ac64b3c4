#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use coffee_counter_api::{app_router, config::AppConfig, db, AppState};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up the full router over a fresh SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: Option<TempDir>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

fn test_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut cfg = AppConfig::new(
        database_url,
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.cors_allow_any_origin = true;
    cfg.db_max_connections = max_connections;
    cfg.db_min_connections = 1;
    cfg
}

impl TestApp {
    /// In-memory database behind a single pooled connection.
    pub async fn new() -> Self {
        Self::build(test_config("sqlite::memory:".to_string(), 1), None).await
    }

    /// File-backed database shared by `max_connections` pooled connections,
    /// so concurrent requests really run side by side.
    pub async fn with_file_db(max_connections: u32) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("counter_test.db").display()
        );
        Self::build(test_config(url, max_connections), Some(dir)).await
    }

    async fn build(cfg: AppConfig, db_dir: Option<TempDir>) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json).expect("failed to serialize json request body"),
                )),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.send(request).await
    }

    /// Sends a raw body with a JSON content type, for malformed payloads.
    pub async fn request_raw(&self, method: Method, uri: &str, raw: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .expect("failed to build request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    /// Admits an order and returns the `order` object from the response.
    pub async fn create_order(&self, body: Value) -> Value {
        let response = self.request(Method::POST, "/api/orders", Some(body)).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "unexpected body: {}",
            response.body
        );
        response.body["order"].clone()
    }

    pub async fn set_status(&self, order_id: i64, status: &str) -> TestResponse {
        self.request(
            Method::PUT,
            &format!("/api/orders/{}/status", order_id),
            Some(json!({ "status": status })),
        )
        .await
    }
}

/// The espresso order used throughout the order tests.
pub fn espresso_order() -> Value {
    json!({
        "order_type": "dine-in",
        "items": [{ "name": "Espresso", "quantity": 2, "price": 39.00 }],
        "total_amount": 78.00
    })
}

pub fn today_stamp() -> String {
    chrono::Utc::now().format("%Y%m%d").to_string()
}
