//! Populates the menu with the counter's starter drinks.
//!
//! Run with: cargo run --bin seed-data
//!
//! Applies pending migrations first. Drinks already on the menu are skipped.

use anyhow::Context;
use tracing::info;

use coffee_counter_api::{config, db, services::menu_seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("loading configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json, cfg.otel_export_enabled());

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to database")?;
    db::run_migrations(&pool)
        .await
        .context("applying migrations")?;

    let report = menu_seed::seed_menu(&pool, cfg.transaction_timeout())
        .await
        .context("seeding menu")?;
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Seed data complete"
    );

    db::close_pool(pool).await?;
    Ok(())
}
