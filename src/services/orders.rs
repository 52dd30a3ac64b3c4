use crate::{
    db::{with_transaction, DbPool},
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    metrics::{ORDERS_ADMITTED, ORDERS_REMOVED, ORDER_ADMISSION_FAILURES},
    services::order_sequencer,
    services::order_status::parse_order_status,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Line item as submitted by the counter client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItem {
    #[validate(length(min = 1, message = "Item name is required"))]
    #[schema(example = "Espresso")]
    pub name: String,
    #[validate(range(min = 1, message = "Item quantity must be a positive integer"))]
    #[schema(example = 2)]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64, example = 39.0)]
    pub price: Decimal,
}

/// Order submission. Fields are optional at the wire level so that a missing
/// field is reported the same way as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[schema(example = "dine-in")]
    pub order_type: Option<String>,
    #[serde(default)]
    #[schema(example = "Arabica")]
    pub coffee_type: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<CreateOrderItem>>,
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 78.0)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    #[schema(example = "Cash")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "39.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    #[schema(example = "ORD-20240307-001")]
    pub order_number: String,
    pub order_type: String,
    pub coffee_type: Option<String>,
    pub priority_number: i32,
    #[schema(value_type = String, example = "78.00")]
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Item price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Currency values are stored and returned with exactly two decimal places.
pub(crate) fn money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A request that passed validation; nothing below this point can be a 400.
#[derive(Debug, Clone)]
struct NewOrder {
    order_type: String,
    coffee_type: Option<String>,
    items: Vec<CreateOrderItem>,
    total_amount: Decimal,
    payment_method: String,
}

impl CreateOrderRequest {
    fn into_new_order(self, default_payment_method: &str) -> Result<NewOrder, ServiceError> {
        let order_type = non_blank(self.order_type)
            .ok_or_else(|| ServiceError::ValidationError("Order type is required".to_string()))?;

        let items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => {
                return Err(ServiceError::ValidationError(
                    "Order must contain at least one item".to_string(),
                ))
            }
        };
        for item in &items {
            item.validate()?;
            if item.name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Item name is required".to_string(),
                ));
            }
        }

        let items: Vec<CreateOrderItem> = items
            .into_iter()
            .map(|item| CreateOrderItem {
                price: money(item.price),
                ..item
            })
            .collect();

        let total_amount = match self.total_amount.map(money) {
            Some(total) if total > Decimal::ZERO => total,
            Some(_) => {
                return Err(ServiceError::ValidationError(
                    "Total amount must be positive".to_string(),
                ))
            }
            None => {
                return Err(ServiceError::ValidationError(
                    "Total amount is required".to_string(),
                ))
            }
        };

        Ok(NewOrder {
            order_type,
            coffee_type: non_blank(self.coffee_type),
            items,
            total_amount,
            payment_method: non_blank(self.payment_method)
                .unwrap_or_else(|| default_payment_method.to_string()),
        })
    }
}

/// Admission, retrieval and removal of counter orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    transaction_timeout: Duration,
    default_payment_method: String,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        transaction_timeout: Duration,
        default_payment_method: impl Into<String>,
    ) -> Self {
        Self {
            db_pool,
            transaction_timeout,
            default_payment_method: default_payment_method.into(),
        }
    }

    /// Validates and admits a new order with its items in one transaction.
    ///
    /// The returned order carries its generated id, order number, priority
    /// and the persisted items.
    #[instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let new_order = request.into_new_order(&self.default_payment_method)?;
        let db = &*self.db_pool;

        let result = with_transaction(db, self.transaction_timeout, move |txn| {
            Box::pin(async move { admit(txn, new_order).await })
        })
        .await;

        match result {
            Ok(order) => {
                ORDERS_ADMITTED.inc();
                info!(
                    order_id = order.id,
                    order_number = %order.order_number,
                    priority_number = order.priority_number,
                    "Order admitted"
                );
                Ok(order)
            }
            Err(e) => {
                ORDER_ADMISSION_FAILURES.inc();
                error!(error = %e, "Order admission rolled back");
                Err(e)
            }
        }
    }

    /// Every order: Pending first through Completed, then by priority,
    /// newest first among equal priorities.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut orders = OrderEntity::find()
            .order_by_asc(order::Column::PriorityNumber)
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list orders");
                ServiceError::DatabaseError(e)
            })?;
        // stable, so priority/created_at order survives within a status
        orders.sort_by_key(|o| o.status.lifecycle_rank());

        attach_items(db, orders).await
    }

    /// Orders in `status`, by priority then newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_by_status(
        &self,
        status: &str,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let status = parse_order_status(status)?;
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .filter(order::Column::Status.eq(status))
            .order_by_asc(order::Column::PriorityNumber)
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, status = %status, "Failed to list orders by status");
                ServiceError::DatabaseError(e)
            })?;

        attach_items(db, orders).await
    }

    /// Fetches a single order with its items
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        attach_items(db, vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Order vanished while loading".into()))
    }

    /// Deletes an order and all of its items in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let deleted = with_transaction(db, self.transaction_timeout, move |txn| {
            Box::pin(async move {
                let items = OrderItemEntity::delete_many()
                    .filter(order_item::Column::OrderId.eq(order_id))
                    .exec(txn)
                    .await?;
                let header = OrderEntity::delete_by_id(order_id).exec(txn).await?;
                info!(
                    order_id,
                    items_removed = items.rows_affected,
                    "Order removal applied"
                );
                Ok::<_, ServiceError>(header.rows_affected)
            })
        })
        .await
        .map_err(|e| {
            error!(error = %e, order_id, "Failed to delete order");
            e
        })?;

        if deleted == 0 {
            return Err(ServiceError::NotFound("Order not found".to_string()));
        }

        ORDERS_REMOVED.inc();
        Ok(())
    }
}

async fn admit(
    txn: &DatabaseTransaction,
    new_order: NewOrder,
) -> Result<OrderResponse, ServiceError> {
    order_sequencer::lock_for_admission(txn).await?;

    let created_at = Utc::now();
    let inserted = order::ActiveModel {
        order_number: Set(order_sequencer::provisional_order_number()),
        order_type: Set(new_order.order_type),
        coffee_type: Set(new_order.coffee_type),
        priority_number: Set(0),
        total_amount: Set(new_order.total_amount),
        payment_method: Set(new_order.payment_method),
        status: Set(OrderStatus::Pending),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let sequence =
        order_sequencer::assign_sequence(txn, inserted.id, created_at.date_naive()).await?;

    let mut sequenced: order::ActiveModel = inserted.into();
    sequenced.order_number = Set(sequence.order_number);
    sequenced.priority_number = Set(sequence.priority_number);
    let order = sequenced.update(txn).await?;

    let rows = new_order.items.into_iter().map(|item| order_item::ActiveModel {
        order_id: Set(order.id),
        product_name: Set(item.name.trim().to_string()),
        quantity: Set(item.quantity),
        unit_price: Set(item.price),
        ..Default::default()
    });
    OrderItemEntity::insert_many(rows).exec(txn).await?;

    attach_items(txn, vec![order])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::InternalError("Admitted order missing".into()))
}

/// Loads the items of every order in `orders` with a single query and
/// pairs them up, preserving the order of `orders`.
async fn attach_items<C>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> Result<Vec<OrderResponse>, ServiceError>
where
    C: ConnectionTrait,
{
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load order items");
            ServiceError::DatabaseError(e)
        })?;

    let mut grouped: HashMap<i32, Vec<OrderItemModel>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.id).unwrap_or_default();
            model_to_response(order, items)
        })
        .collect())
}

fn model_to_response(order: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        order_type: order.order_type,
        coffee_type: order.coffee_type,
        priority_number: order.priority_number,
        total_amount: money(order.total_amount),
        payment_method: order.payment_method,
        status: order.status,
        created_at: order.created_at,
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_name: item.product_name,
                quantity: item.quantity,
                price: money(item.unit_price),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn espresso() -> CreateOrderItem {
        CreateOrderItem {
            name: "Espresso".into(),
            quantity: 2,
            price: dec!(39.00),
        }
    }

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
            order_type: Some("dine-in".into()),
            items: Some(vec![espresso()]),
            total_amount: Some(dec!(78.00)),
            ..Default::default()
        }
    }

    #[test]
    fn missing_payment_method_uses_default() {
        let order = valid_request().into_new_order("Cash").unwrap();
        assert_eq!(order.payment_method, "Cash");
        assert_eq!(order.order_type, "dine-in");
    }

    #[test]
    fn blank_order_type_is_rejected() {
        let mut request = valid_request();
        request.order_type = Some("   ".into());
        assert_matches!(
            request.into_new_order("Cash"),
            Err(ServiceError::ValidationError(msg)) if msg == "Order type is required"
        );
    }

    #[test]
    fn empty_or_missing_items_are_rejected() {
        let mut empty = valid_request();
        empty.items = Some(vec![]);
        assert_matches!(empty.into_new_order("Cash"), Err(ServiceError::ValidationError(_)));

        let mut missing = valid_request();
        missing.items = None;
        assert_matches!(missing.into_new_order("Cash"), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut request = valid_request();
        request.items = Some(vec![CreateOrderItem {
            quantity: 0,
            ..espresso()
        }]);
        assert_matches!(request.into_new_order("Cash"), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn total_amount_must_be_present_and_positive() {
        let mut missing = valid_request();
        missing.total_amount = None;
        assert_matches!(
            missing.into_new_order("Cash"),
            Err(ServiceError::ValidationError(msg)) if msg == "Total amount is required"
        );

        let mut zero = valid_request();
        zero.total_amount = Some(Decimal::ZERO);
        assert_matches!(zero.into_new_order("Cash"), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn amounts_are_rounded_before_persisting() {
        let mut request = valid_request();
        request.items = Some(vec![CreateOrderItem {
            price: dec!(1.239),
            ..espresso()
        }]);
        request.total_amount = Some(dec!(2.475));

        let order = request.into_new_order("Cash").unwrap();

        assert_eq!(order.items[0].price.to_string(), "1.24");
        assert_eq!(order.total_amount.to_string(), "2.48");
    }

    #[test]
    fn total_that_rounds_to_zero_is_rejected() {
        let mut request = valid_request();
        request.total_amount = Some(dec!(0.004));
        assert_matches!(
            request.into_new_order("Cash"),
            Err(ServiceError::ValidationError(msg)) if msg == "Total amount must be positive"
        );
    }

    #[test]
    fn money_has_two_decimal_places() {
        assert_eq!(money(dec!(39)).to_string(), "39.00");
        assert_eq!(money(dec!(4.5)).to_string(), "4.50");
        assert_eq!(money(dec!(1.239)).to_string(), "1.24");
    }
}
