mod common;

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use coffee_counter_api::entities::{order, order_item};
use common::{espresso_order, TestApp};
use futures::future::join_all;
use rstest::rstest;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

async fn assert_nothing_persisted(app: &TestApp) {
    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(order_item::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[rstest]
#[case::empty_items(json!({ "order_type": "dine-in", "items": [], "total_amount": 78.0 }))]
#[case::missing_items(json!({ "order_type": "dine-in", "total_amount": 78.0 }))]
#[case::items_not_an_array(json!({ "order_type": "dine-in", "items": "espresso", "total_amount": 78.0 }))]
#[case::missing_order_type(json!({ "items": [{ "name": "Espresso", "quantity": 2, "price": 39.0 }], "total_amount": 78.0 }))]
#[case::blank_order_type(json!({ "order_type": " ", "items": [{ "name": "Espresso", "quantity": 2, "price": 39.0 }], "total_amount": 78.0 }))]
#[case::missing_total(json!({ "order_type": "dine-in", "items": [{ "name": "Espresso", "quantity": 2, "price": 39.0 }] }))]
#[case::zero_quantity(json!({ "order_type": "dine-in", "items": [{ "name": "Espresso", "quantity": 0, "price": 39.0 }], "total_amount": 78.0 }))]
#[case::negative_price(json!({ "order_type": "dine-in", "items": [{ "name": "Espresso", "quantity": 1, "price": -1.0 }], "total_amount": 78.0 }))]
#[tokio::test]
async fn invalid_admissions_are_rejected_without_writes(#[case] body: Value) {
    let app = TestApp::new().await;

    let response = app.request(Method::POST, "/api/orders", Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert!(response.body["message"].is_string());
    assert_nothing_persisted(&app).await;
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(Method::POST, "/api/orders", "{\"order_type\": ")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_nothing_persisted(&app).await;
}

#[tokio::test]
async fn error_bodies_carry_the_request_id() {
    let app = TestApp::new().await;

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/orders/31337")
        .header("x-request-id", "counter-req-1")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["request_id"], "counter-req-1");
    assert_eq!(
        response.headers.get("x-request-id").unwrap(),
        "counter-req-1"
    );
}

#[tokio::test]
async fn store_failure_mid_admission_rolls_back_the_header() {
    let app = TestApp::new().await;
    app.db()
        .execute_unprepared("ALTER TABLE order_items RENAME TO order_items_parked")
        .await
        .unwrap();

    let response = app
        .request(Method::POST, "/api/orders", Some(espresso_order()))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "Database error");

    app.db()
        .execute_unprepared("ALTER TABLE order_items_parked RENAME TO order_items")
        .await
        .unwrap();
    assert_nothing_persisted(&app).await;

    let retried = app.create_order(espresso_order()).await;
    assert_eq!(retried["priority_number"], 1);
    assert_eq!(retried["items"].as_array().unwrap().len(), 1);
}

async fn admit_concurrently(app: Arc<TestApp>, count: usize) -> Vec<Value> {
    let handles = (0..count).map(|_| {
        let app = app.clone();
        tokio::spawn(async move { app.create_order(espresso_order()).await })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("admission task panicked"))
        .collect()
}

fn assert_distinct_sequence(orders: &[Value]) {
    let numbers: HashSet<String> = orders
        .iter()
        .map(|o| o["order_number"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(numbers.len(), orders.len(), "duplicate order numbers");

    let mut priorities: Vec<i64> = orders
        .iter()
        .map(|o| o["priority_number"].as_i64().unwrap())
        .collect();
    priorities.sort_unstable();
    let expected: Vec<i64> = (1..=orders.len() as i64).collect();
    assert_eq!(priorities, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_get_distinct_numbers_and_priorities() {
    let app = Arc::new(TestApp::new().await);

    let orders = admit_concurrently(app.clone(), 12).await;

    assert_distinct_sequence(&orders);
    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_across_pooled_connections() {
    let app = Arc::new(TestApp::with_file_db(4).await);

    let orders = admit_concurrently(app.clone(), 12).await;

    assert_distinct_sequence(&orders);
    assert_eq!(order_item::Entity::find().count(app.db()).await.unwrap(), 12);
}
