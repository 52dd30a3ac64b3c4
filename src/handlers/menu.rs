use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{created_response, json_body, parse_id, success_response};
use crate::errors::ServiceError;
use crate::services::menu::{CreateMenuItemRequest, MenuItemResponse, UpdateMenuItemRequest};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuListBody {
    pub success: bool,
    pub items: Vec<MenuItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuItemBody {
    pub success: bool,
    pub item: MenuItemResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuItemDeletedBody {
    pub success: bool,
    pub message: String,
    pub id: i32,
}

/// Routes mounted under `/api/menu`
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/category/:category", get(list_items_by_category))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

#[utoipa::path(
    get,
    path = "/api/menu/items",
    summary = "List menu items",
    responses(
        (status = 200, description = "Menu items retrieved successfully", body = MenuListBody),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn list_items(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let items = state.services.menu.list_items().await?;
    Ok(success_response(MenuListBody {
        success: true,
        items,
    }))
}

#[utoipa::path(
    get,
    path = "/api/menu/items/category/{category}",
    summary = "List menu items in a category",
    params(("category" = String, Path, description = "hot or cold")),
    responses(
        (status = 200, description = "Menu items retrieved successfully", body = MenuListBody),
        (status = 400, description = "Invalid category", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn list_items_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Response, ServiceError> {
    let items = state.services.menu.list_by_category(&category).await?;
    Ok(success_response(MenuListBody {
        success: true,
        items,
    }))
}

#[utoipa::path(
    get,
    path = "/api/menu/items/{id}",
    summary = "Get menu item",
    params(("id" = i32, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item retrieved successfully", body = MenuItemBody),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "menu item")?;
    let item = state.services.menu.get_item(id).await?;
    Ok(success_response(MenuItemBody {
        success: true,
        item,
    }))
}

#[utoipa::path(
    post,
    path = "/api/menu/items",
    summary = "Create menu item",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created successfully", body = MenuItemBody),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateMenuItemRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request = json_body(payload)?;
    let item = state.services.menu.create_item(request).await?;
    Ok(created_response(MenuItemBody {
        success: true,
        item,
    }))
}

#[utoipa::path(
    put,
    path = "/api/menu/items/{id}",
    summary = "Update menu item",
    params(("id" = i32, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated successfully", body = MenuItemBody),
        (status = 400, description = "Nothing to update or invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMenuItemRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "menu item")?;
    let request = json_body(payload)?;
    let item = state.services.menu.update_item(id, request).await?;
    Ok(success_response(MenuItemBody {
        success: true,
        item,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/menu/items/{id}",
    summary = "Delete menu item",
    params(("id" = i32, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item deleted successfully", body = MenuItemDeletedBody),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "menu item")?;
    state.services.menu.delete_item(id).await?;
    Ok(success_response(MenuItemDeletedBody {
        success: true,
        message: "Menu item deleted successfully".to_string(),
        id,
    }))
}
