use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{created_response, json_body, parse_id, success_response};
use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;
use crate::services::order_status::UpdateOrderStatusRequest;
use crate::services::orders::{CreateOrderRequest, OrderResponse};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListBody {
    pub success: bool,
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderBody {
    pub success: bool,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusBody {
    pub success: bool,
    pub message: String,
    pub order_id: i32,
    pub new_status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDeletedBody {
    pub success: bool,
    pub message: String,
    pub order_id: i32,
}

/// Routes mounted under `/api/orders`
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/status/:status", get(list_orders_by_status))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/status", put(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List orders",
    description = "Every order with its items, grouped by workflow status then queue priority",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = OrderListBody,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let orders = state.services.orders.list_orders().await?;
    Ok(success_response(OrderListBody {
        success: true,
        orders,
    }))
}

#[utoipa::path(
    get,
    path = "/api/orders/status/{status}",
    summary = "List orders by status",
    params(("status" = String, Path, description = "Pending, Preparing, Ready or Completed")),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = OrderListBody),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Response, ServiceError> {
    let orders = state.services.orders.list_orders_by_status(&status).await?;
    Ok(success_response(OrderListBody {
        success: true,
        orders,
    }))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    summary = "Get order",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderBody),
        (status = 400, description = "Invalid order id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let order_id = parse_id(&id, "order")?;
    let order = state.services.orders.get_order(order_id).await?;
    Ok(success_response(OrderBody {
        success: true,
        order,
    }))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    description = "Admit a new order: assigns its order number and queue priority and stores it with its items",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderBody,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request = json_body(payload)?;
    let order = state.services.orders.create_order(request).await?;
    Ok(created_response(OrderBody {
        success: true,
        order,
    }))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    summary = "Update order status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated successfully", body = OrderStatusBody),
        (status = 400, description = "Invalid status or order id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let order_id = parse_id(&id, "order")?;
    let status = json_body(payload)?
        .status
        .ok_or_else(|| ServiceError::ValidationError("Status is required".to_string()))?;

    let update = state
        .services
        .order_status
        .set_status(order_id, &status)
        .await?;

    Ok(success_response(OrderStatusBody {
        success: true,
        message: "Order status updated successfully".to_string(),
        order_id: update.order_id,
        new_status: update.new_status,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    summary = "Delete order",
    description = "Removes the order together with all of its items",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted successfully", body = OrderDeletedBody),
        (status = 400, description = "Invalid order id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_id = parse_id(&id, "order")?;
    state.services.orders.delete_order(order_id).await?;
    Ok(Json(OrderDeletedBody {
        success: true,
        message: "Order deleted successfully".to_string(),
        order_id,
    }))
}
