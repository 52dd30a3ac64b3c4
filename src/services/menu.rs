use crate::{
    db::DbPool,
    entities::menu_item::{self, Entity as MenuItemEntity, MenuCategory, Model as MenuItemModel},
    errors::ServiceError,
    services::orders::money,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

pub const INVALID_CATEGORY_MESSAGE: &str = "Invalid category. Must be one of: hot, cold";
const MENU_ITEM_NOT_FOUND: &str = "Menu item not found";

pub fn parse_category(raw: &str) -> Result<MenuCategory, ServiceError> {
    MenuCategory::from_str(raw.trim())
        .map_err(|_| ServiceError::ValidationError(INVALID_CATEGORY_MESSAGE.to_string()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    #[serde(default)]
    #[schema(example = "Flat White")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 4.5)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_available: Option<bool>,
    /// `hot` (default) or `cold`
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields keep their stored value. `description` and
/// `image_url` may be sent as `null` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

impl UpdateMenuItemRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.is_available.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "4.50")]
    pub price: Decimal,
    pub is_available: bool,
    pub category: MenuCategory,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MenuItemModel> for MenuItemResponse {
    fn from(model: MenuItemModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: money(model.price),
            is_available: model.is_available,
            category: model.category,
            image_url: model.image_url,
            created_at: model.created_at,
        }
    }
}

fn validate_name(name: Option<String>) -> Result<String, ServiceError> {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::ValidationError("Name is required".to_string()))
}

fn validate_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price must not be negative".to_string(),
        ));
    }
    Ok(money(price))
}

/// Keyed CRUD over the menu catalog.
#[derive(Clone)]
pub struct MenuService {
    db_pool: Arc<DbPool>,
}

impl MenuService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<MenuItemResponse>, ServiceError> {
        let items = MenuItemEntity::find()
            .order_by_asc(menu_item::Column::Category)
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list menu items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<MenuItemResponse>, ServiceError> {
        let category = parse_category(category)?;

        let items = MenuItemEntity::find()
            .filter(menu_item::Column::Category.eq(category))
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, %category, "Failed to list menu items by category");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<MenuItemResponse, ServiceError> {
        self.find_model(id).await.map(Into::into)
    }

    #[instrument(skip(self, request))]
    pub async fn create_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        let name = validate_name(request.name)?;
        let price = request
            .price
            .ok_or_else(|| ServiceError::ValidationError("Price is required".to_string()))
            .and_then(validate_price)?;
        let category = match request.category.as_deref() {
            Some(raw) => parse_category(raw)?,
            None => MenuCategory::Hot,
        };

        let model = menu_item::ActiveModel {
            name: Set(name),
            description: Set(request.description),
            price: Set(price),
            is_available: Set(request.is_available.unwrap_or(true)),
            category: Set(category),
            image_url: Set(request.image_url),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create menu item");
            ServiceError::DatabaseError(e)
        })?;

        info!(menu_item_id = model.id, "Menu item created");
        Ok(model.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_item(
        &self,
        id: i32,
        request: UpdateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        if request.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }
        let category = request.category.as_deref().map(parse_category).transpose()?;
        let name = request.name.map(|n| validate_name(Some(n))).transpose()?;
        let price = request.price.map(validate_price).transpose()?;

        let mut active: menu_item::ActiveModel = self.find_model(id).await?.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(category) = category {
            active.category = Set(category);
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(image_url);
        }

        let updated = active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, menu_item_id = id, "Failed to update menu item");
            ServiceError::DatabaseError(e)
        })?;

        info!(menu_item_id = id, "Menu item updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i32) -> Result<(), ServiceError> {
        let result = MenuItemEntity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, menu_item_id = id, "Failed to delete menu item");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(MENU_ITEM_NOT_FOUND.to_string()));
        }

        info!(menu_item_id = id, "Menu item deleted");
        Ok(())
    }

    async fn find_model(&self, id: i32) -> Result<MenuItemModel, ServiceError> {
        MenuItemEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, menu_item_id = id, "Failed to fetch menu item");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(MENU_ITEM_NOT_FOUND.to_string()))
    }
}
