//! Prometheus metrics for order intake and the store layer.
//!
//! Every collector is registered in [`REGISTRY`] on first use, and
//! [`metrics_handler`] renders the registry in text exposition format.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ORDERS_ADMITTED: IntCounter =
        IntCounter::new("orders_admitted_total", "Total number of orders admitted")
            .expect("metric can be created");
    pub static ref ORDER_ADMISSION_FAILURES: IntCounter = IntCounter::new(
        "order_admission_failures_total",
        "Total number of order admissions that rolled back"
    )
    .expect("metric can be created");
    pub static ref ORDER_STATUS_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "order_status_transitions_total",
            "Status updates applied, labelled by target status"
        ),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref ORDERS_REMOVED: IntCounter =
        IntCounter::new("orders_removed_total", "Total number of orders deleted")
            .expect("metric can be created");
    pub static ref DB_TRANSACTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "db_transactions_total",
            "Scoped transactions, labelled by outcome (commit, rollback, timeout)"
        ),
        &["outcome"]
    )
    .expect("metric can be created");
    pub static ref DB_TRANSACTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "db_transaction_duration_seconds",
            "Wall time of scoped transactions"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .expect("metric can be created");
    pub static ref DB_CONNECTION_FAILURES: IntCounter = IntCounter::new(
        "db_connection_failures_total",
        "Failed database health checks"
    )
    .expect("metric can be created");
}

/// Registers all collectors with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ORDERS_ADMITTED.clone()),
        Box::new(ORDER_ADMISSION_FAILURES.clone()),
        Box::new(ORDER_STATUS_TRANSITIONS.clone()),
        Box::new(ORDERS_REMOVED.clone()),
        Box::new(DB_TRANSACTIONS.clone()),
        Box::new(DB_TRANSACTION_DURATION.clone()),
        Box::new(DB_CONNECTION_FAILURES.clone()),
    ];

    for collector in collectors {
        // AlreadyReg is expected on repeated calls
        let _ = REGISTRY.register(collector);
    }
}

/// Renders every registered metric in Prometheus text format.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    register_metrics();

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// `GET /metrics`
pub async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
