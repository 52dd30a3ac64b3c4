//! Starter menu for a fresh counter database.

use crate::{
    db::with_transaction,
    entities::menu_item::{self, Entity as MenuItemEntity, MenuCategory},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

struct StarterItem {
    name: &'static str,
    description: &'static str,
    category: MenuCategory,
    image_url: &'static str,
}

const STARTER_PRICE_CENTS: i64 = 3900;

static STARTER_MENU: [StarterItem; 6] = [
    StarterItem {
        name: "Espresso",
        description: "Strong concentrated coffee, served in small shots",
        category: MenuCategory::Hot,
        image_url: "images/espresso.jpeg",
    },
    StarterItem {
        name: "Americano",
        description: "Espresso diluted with hot water for a smoother taste",
        category: MenuCategory::Hot,
        image_url: "images/americano.jpeg",
    },
    StarterItem {
        name: "Cappuccino",
        description: "Espresso with steamed milk and silky foam",
        category: MenuCategory::Hot,
        image_url: "images/cappuccino.jpeg",
    },
    StarterItem {
        name: "Iced Latte",
        description: "Espresso chilled with milk and ice",
        category: MenuCategory::Cold,
        image_url: "images/iced-latte.jpeg",
    },
    StarterItem {
        name: "Iced Americano",
        description: "Refreshing diluted espresso over ice",
        category: MenuCategory::Cold,
        image_url: "images/iced-americano.jpeg",
    },
    StarterItem {
        name: "Nitro Cold Brew",
        description: "Creamy cold brew infused with nitrogen",
        category: MenuCategory::Cold,
        image_url: "images/nitro-cold-brew.jpeg",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Inserts the starter menu. Items whose name is already on the menu are
/// left as they are, so running this twice is harmless.
pub async fn seed_menu(
    db: &DatabaseConnection,
    timeout: Duration,
) -> Result<SeedReport, ServiceError> {
    let report = with_transaction(db, timeout, |txn| {
        Box::pin(async move {
            let names: Vec<&str> = STARTER_MENU.iter().map(|item| item.name).collect();
            let existing: HashSet<String> = MenuItemEntity::find()
                .filter(menu_item::Column::Name.is_in(names))
                .all(txn)
                .await?
                .into_iter()
                .map(|item| item.name)
                .collect();

            let missing: Vec<menu_item::ActiveModel> = STARTER_MENU
                .iter()
                .filter(|item| !existing.contains(item.name))
                .map(|item| menu_item::ActiveModel {
                    name: Set(item.name.to_string()),
                    description: Set(Some(item.description.to_string())),
                    price: Set(Decimal::new(STARTER_PRICE_CENTS, 2)),
                    is_available: Set(true),
                    category: Set(item.category),
                    image_url: Set(Some(item.image_url.to_string())),
                    ..Default::default()
                })
                .collect();

            let inserted = missing.len();
            if inserted > 0 {
                MenuItemEntity::insert_many(missing).exec(txn).await?;
            }

            Ok::<_, ServiceError>(SeedReport {
                inserted,
                skipped: STARTER_MENU.len() - inserted,
            })
        })
    })
    .await?;

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Starter menu seeded"
    );
    Ok(report)
}
