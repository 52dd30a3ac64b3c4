use coffee_counter_api::migrator::Migrator;
use sea_orm::Database;
use sea_orm_migration::{MigratorTrait, SchemaManager};

#[tokio::test]
async fn migrations_apply_and_roll_back_cleanly() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let manager = SchemaManager::new(&db);

    Migrator::up(&db, None).await.unwrap();
    for table in ["orders", "order_items", "menu_items"] {
        assert!(manager.has_table(table).await.unwrap(), "{} missing", table);
    }
    assert!(manager.has_column("orders", "priority_number").await.unwrap());
    assert!(manager.has_column("order_items", "unit_price").await.unwrap());
    assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

    Migrator::down(&db, None).await.unwrap();
    for table in ["orders", "order_items", "menu_items"] {
        assert!(!manager.has_table(table).await.unwrap(), "{} left behind", table);
    }
}
