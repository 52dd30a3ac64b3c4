use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coffee Counter API",
        version = "0.1.0",
        description = r#"
# Coffee Counter API

Order intake for a food-service counter.

- **Orders**: admission with generated order numbers and queue priority, kitchen status workflow, removal
- **Menu**: hot and cold catalog items

Every response carries a `success` flag; failures add a human-readable `message`
and the `X-Request-Id` of the call.
"#
    ),
    paths(
        crate::handlers::orders::list_orders,
        crate::handlers::orders::list_orders_by_status,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,
        crate::handlers::menu::list_items,
        crate::handlers::menu::list_items_by_category,
        crate::handlers::menu::get_item,
        crate::handlers::menu::create_item,
        crate::handlers::menu::update_item,
        crate::handlers::menu::delete_item,
    ),
    components(
        schemas(
            crate::entities::order::OrderStatus,
            crate::entities::menu_item::MenuCategory,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::CreateOrderItem,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::order_status::UpdateOrderStatusRequest,
            crate::services::menu::CreateMenuItemRequest,
            crate::services::menu::UpdateMenuItemRequest,
            crate::services::menu::MenuItemResponse,
            crate::handlers::orders::OrderListBody,
            crate::handlers::orders::OrderBody,
            crate::handlers::orders::OrderStatusBody,
            crate::handlers::orders::OrderDeletedBody,
            crate::handlers::menu::MenuListBody,
            crate::handlers::menu::MenuItemBody,
            crate::handlers::menu::MenuItemDeletedBody,
            crate::errors::ErrorResponse
        )
    ),
    tags(
        (name = "orders", description = "Order admission and kitchen workflow"),
        (name = "menu", description = "Menu catalog")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        assert!(paths.contains_key("/api/orders"));
        assert!(paths.contains_key("/api/orders/{id}/status"));
        assert!(paths.contains_key("/api/menu/items/category/{category}"));
    }
}
