use crate::{
    db::DbPool,
    entities::order::{self, OrderStatus},
    errors::ServiceError,
    metrics::ORDER_STATUS_TRANSITIONS,
};
use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

pub const INVALID_STATUS_MESSAGE: &str =
    "Invalid status. Must be one of: Pending, Preparing, Ready, Completed";

/// Parses a status name exactly as stored; anything else is rejected before
/// touching the store.
pub fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim())
        .map_err(|_| ServiceError::InvalidStatus(INVALID_STATUS_MESSAGE.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of Pending, Preparing, Ready, Completed
    #[schema(example = "Preparing")]
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdate {
    pub order_id: i32,
    pub new_status: OrderStatus,
}

/// Applies kitchen workflow transitions.
///
/// Any of the four statuses may be set from any other; the counter display
/// moves orders backwards when a ticket is reopened.
#[derive(Clone)]
pub struct OrderStatusService {
    db_pool: Arc<DbPool>,
}

impl OrderStatusService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Sets `status` on order `order_id`, leaving every other column untouched.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: i32,
        status: &str,
    ) -> Result<StatusUpdate, ServiceError> {
        let new_status = parse_order_status(status)?;
        let db = &*self.db_pool;

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(new_status))
            .filter(order::Column::Id.eq(order_id))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to update order status");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Order not found".to_string()));
        }

        ORDER_STATUS_TRANSITIONS
            .with_label_values(&[&new_status.to_string()])
            .inc();
        info!(order_id, status = %new_status, "Order status updated");

        Ok(StatusUpdate {
            order_id,
            new_status,
        })
    }
}
