//! Order number and queue priority assignment.
//!
//! Sequencing piggybacks on the store-generated `orders.id`: the admission
//! transaction inserts the order header first, then derives the public
//! order number from that id and the live active-order count. All reads that
//! feed the decision happen after the admission has exclusive write access,
//! so two concurrent admissions can never observe the same snapshot.

use crate::entities::order::{self, OrderStatus};
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};
use tracing::debug;
use uuid::Uuid;

/// `order_number` and `priority_number` handed to a freshly admitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub order_number: String,
    pub priority_number: i32,
}

/// `ORD-YYYYMMDD-NNN`, with the sequence zero padded to at least three digits.
pub fn format_order_number(admitted_on: NaiveDate, sequence: i32) -> String {
    format!("ORD-{}-{:03}", admitted_on.format("%Y%m%d"), sequence)
}

/// 1-based queue rank given the number of orders already active.
pub fn priority_for(active_before: u64) -> i32 {
    i32::try_from(active_before)
        .unwrap_or(i32::MAX - 1)
        .saturating_add(1)
}

/// Unique stand-in for `order_number` until the real one can be derived
/// from the inserted row's id.
pub fn provisional_order_number() -> String {
    format!("TMP-{}", Uuid::new_v4().simple())
}

/// Serializes admissions against each other for the rest of the transaction.
///
/// Postgres takes a table lock that conflicts with itself but not with plain
/// reads. SQLite needs nothing here: the header insert that follows takes the
/// database write lock, and nothing is read before it. MySQL is not a
/// supported driver.
pub async fn lock_for_admission<C>(conn: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    match conn.get_database_backend() {
        DbBackend::Postgres => {
            conn.execute_unprepared("LOCK TABLE orders IN SHARE ROW EXCLUSIVE MODE")
                .await?;
        }
        DbBackend::Sqlite | DbBackend::MySql => {}
    }
    Ok(())
}

/// Derives the sequence for the order row `order_id`, which must already be
/// inserted in the current transaction.
pub async fn assign_sequence<C>(
    conn: &C,
    order_id: i32,
    admitted_on: NaiveDate,
) -> Result<Sequence, DbErr>
where
    C: ConnectionTrait,
{
    let active_before = order::Entity::find()
        .filter(order::Column::Status.is_in(OrderStatus::ACTIVE))
        .filter(order::Column::Id.ne(order_id))
        .count(conn)
        .await?;

    let sequence = Sequence {
        order_number: format_order_number(admitted_on, order_id),
        priority_number: priority_for(active_before),
    };

    debug!(
        order_id,
        active_before,
        order_number = %sequence.order_number,
        priority_number = sequence.priority_number,
        "Assigned order sequence"
    );

    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "ORD-20240307-001")]
    #[case(42, "ORD-20240307-042")]
    #[case(999, "ORD-20240307-999")]
    #[case(1000, "ORD-20240307-1000")]
    fn formats_order_numbers(#[case] sequence: i32, #[case] expected: &str) {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_order_number(date, sequence), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(17, 18)]
    fn priority_is_one_past_active_count(#[case] active: u64, #[case] expected: i32) {
        assert_eq!(priority_for(active), expected);
    }

    #[test]
    fn priority_saturates_instead_of_overflowing() {
        assert_eq!(priority_for(u64::MAX), i32::MAX);
    }

    #[test]
    fn provisional_numbers_do_not_collide() {
        let a = provisional_order_number();
        let b = provisional_order_number();
        assert!(a.starts_with("TMP-"));
        assert_ne!(a, b);
    }
}
