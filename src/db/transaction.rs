/*!
 * Transaction Helper Utilities
 *
 * Scoped transactions with commit-or-rollback on every exit path and an
 * upper bound on how long a unit of work may hold its connection.
 */

use crate::errors::ServiceError;
use crate::metrics::{DB_TRANSACTIONS, DB_TRANSACTION_DURATION};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{error, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// - `Ok` commits, `Err` rolls back and returns the closure's error unchanged.
/// - If `timeout` elapses first the in-flight future is dropped together with
///   its `DatabaseTransaction`, which rolls the transaction back, and
///   `ServiceError::TransactionTimeout` is returned.
///
/// ```rust,ignore
/// let order = with_transaction(&db, Duration::from_secs(10), |txn| {
///     Box::pin(async move {
///         let order = order_model.insert(txn).await?;
///         order_item::Entity::insert_many(items).exec(txn).await?;
///         Ok(order)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(
    db: &DatabaseConnection,
    timeout: Duration,
    f: F,
) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let timer = DB_TRANSACTION_DURATION.start_timer();

    let scoped = async move {
        let txn = db.begin().await?;
        match f(&txn).await {
            Ok(value) => {
                txn.commit().await?;
                DB_TRANSACTIONS.with_label_values(&["commit"]).inc();
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(error = %rollback_err, "Transaction rollback failed");
                }
                DB_TRANSACTIONS.with_label_values(&["rollback"]).inc();
                Err(err)
            }
        }
    };

    let result = match tokio::time::timeout(timeout, scoped).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Transaction timed out and was rolled back");
            DB_TRANSACTIONS.with_label_values(&["timeout"]).inc();
            Err(ServiceError::TransactionTimeout(timeout.as_secs()))
        }
    };

    timer.observe_duration();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use crate::entities::menu_item::{self, MenuCategory};
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, EntityTrait, PaginatorTrait, Set};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
        db
    }

    fn latte() -> menu_item::ActiveModel {
        menu_item::ActiveModel {
            name: Set("Latte".into()),
            price: Set(Decimal::new(450, 2)),
            is_available: Set(true),
            category: Set(MenuCategory::Hot),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transaction_commit() {
        let db = setup().await;

        let inserted = with_transaction(&db, Duration::from_secs(5), |txn| {
            Box::pin(async move { Ok::<_, ServiceError>(latte().insert(txn).await?) })
        })
        .await
        .unwrap();

        assert_eq!(inserted.name, "Latte");
        assert_eq!(menu_item::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transaction_rollback_on_error() {
        let db = setup().await;

        let result: Result<(), ServiceError> =
            with_transaction(&db, Duration::from_secs(5), |txn| {
                Box::pin(async move {
                    latte().insert(txn).await?;
                    Err(ServiceError::InternalError("boom".into()))
                })
            })
            .await;

        assert_matches!(result, Err(ServiceError::InternalError(_)));
        assert_eq!(menu_item::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transaction_timeout_rolls_back() {
        let db = setup().await;

        let result: Result<(), ServiceError> =
            with_transaction(&db, Duration::from_millis(50), |txn| {
                Box::pin(async move {
                    latte().insert(txn).await?;
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<_, ServiceError>(())
                })
            })
            .await;

        assert_matches!(result, Err(ServiceError::TransactionTimeout(_)));
        assert_eq!(menu_item::Entity::find().count(&db).await.unwrap(), 0);
    }
}
