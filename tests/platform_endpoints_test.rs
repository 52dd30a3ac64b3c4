mod common;

use axum::http::StatusCode;
use common::{espresso_order, TestApp};

#[tokio::test]
async fn root_banner_and_health() {
    let app = TestApp::new().await;

    let root = app.get("/").await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body, "coffee-counter-api up");

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "up");
    assert_eq!(health.body["database"], "up");
}

#[tokio::test]
async fn metrics_expose_admission_counter() {
    let app = TestApp::new().await;
    app.create_order(espresso_order()).await;

    let metrics = app.get("/metrics").await;

    assert_eq!(metrics.status, StatusCode::OK);
    let text = metrics.body.as_str().unwrap();
    assert!(text.contains("orders_admitted_total"));
    assert!(text.contains("db_transactions_total"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let doc = app.get("/api-docs/openapi.json").await;

    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["paths"]["/api/orders"].is_object());
    assert!(doc.body["paths"]["/api/menu/items/{id}"].is_object());
}

#[tokio::test]
async fn responses_carry_a_generated_request_id() {
    let app = TestApp::new().await;

    let response = app.get("/api/orders").await;

    let request_id = response.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}
