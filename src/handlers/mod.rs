pub mod common;
pub mod menu;
pub mod orders;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{menu::MenuService, order_status::OrderStatusService, orders::OrderService};
use std::sync::Arc;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
    pub menu: Arc<MenuService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            orders: Arc::new(OrderService::new(
                db_pool.clone(),
                config.transaction_timeout(),
                config.default_payment_method.clone(),
            )),
            order_status: Arc::new(OrderStatusService::new(db_pool.clone())),
            menu: Arc::new(MenuService::new(db_pool)),
        }
    }
}
