use festa_common::Money;
use sqlx::{Error as SqlxError, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Actor, NewOrder, Order},
    order_objects::OrderQueryFilter,
};

/// Inserts a new `Pending` order. The deposit starts at zero and the remaining amount equals the
/// total, so the split invariant holds from the first row.
pub async fn insert_order(order: &NewOrder, total: Money, conn: &mut SqliteConnection) -> Result<Order, SqlxError> {
    let order = sqlx::query_as(
        r#"INSERT INTO orders (
            buyer_id, provider_id, package_id, status, total_amount, deposit_amount, remaining_amount,
            event_date, latitude, longitude, address, notes
        ) VALUES ($1, $2, $3, 'Pending', $4, 0, $4, $5, $6, $7, $8, $9)
        RETURNING *"#,
    )
    .bind(order.buyer_id)
    .bind(order.provider_id)
    .bind(order.package_id)
    .bind(total)
    .bind(order.event_date)
    .bind(order.latitude)
    .bind(order.longitude)
    .bind(order.address.as_deref())
    .bind(order.notes.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_buyer(buyer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqlxError> {
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE buyer_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC, id DESC",
    )
    .bind(buyer_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Providers only see orders with a confirmed deposit or later. An unpaid `Pending` order is not
/// theirs to act on yet.
pub async fn fetch_orders_for_provider(provider_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqlxError> {
    let orders = sqlx::query_as(
        r#"SELECT * FROM orders
        WHERE provider_id = $1 AND status IN ('Paid', 'Accepted', 'InProgress', 'Completed') AND deleted_at IS NULL
        ORDER BY created_at DESC, id DESC"#,
    )
    .bind(provider_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqlxError> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE deleted_at IS NULL");
    if let Some(buyer_id) = query.buyer_id {
        builder.push(" AND buyer_id = ").push_bind(buyer_id);
    }
    if let Some(provider_id) = query.provider_id {
        builder.push(" AND provider_id = ").push_bind(provider_id);
    }
    if let Some(statuses) = &query.status {
        if !statuses.is_empty() {
            builder.push(" AND status IN (");
            let mut in_list = builder.separated(", ");
            for status in statuses {
                in_list.push_bind(status.to_string());
            }
            builder.push(")");
        }
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at <= ").push_bind(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Refreshes the order's amount split from the current catalog price, guarded on the order still
/// being `Pending`. Returns `None` when the guard missed.
pub async fn set_deposit_split(
    id: i64,
    total: Money,
    deposit: Money,
    remaining: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET total_amount = $1, deposit_amount = $2, remaining_amount = $3, updated_at = CURRENT_TIMESTAMP
        WHERE id = $4 AND status = 'Pending' AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(total)
    .bind(deposit)
    .bind(remaining)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

// The transition writers below are all single compare-and-set statements: the status guard and the
// write happen atomically, so of two racing transitions exactly one matches a row.

pub async fn mark_paid(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'Paid', paid_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'Pending' AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn accept_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'Accepted', accepted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'Paid' AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn start_progress(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'InProgress', updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'Accepted' AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn complete_order(id: i64, by: &Actor, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'Completed', completed_at = CURRENT_TIMESTAMP, completed_by = $1, completed_by_id = $2,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status IN ('Accepted', 'InProgress') AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(by.role)
    .bind(by.id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn reject_order(id: i64, by: &Actor, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'Rejected', rejected_at = CURRENT_TIMESTAMP, rejected_by = $1, rejected_by_id = $2,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status NOT IN ('Completed', 'Cancelled', 'Rejected') AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(by.role)
    .bind(by.id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn cancel_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET status = 'Cancelled', cancelled_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status IN ('Pending', 'Paid') AND deleted_at IS NULL
        RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Soft delete. Financially live orders (`Paid`, `Accepted`, `InProgress`) never match the guard.
pub async fn soft_delete_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqlxError> {
    let order = sqlx::query_as(
        r#"UPDATE orders
        SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND deleted_at IS NULL AND status NOT IN ('Paid', 'Accepted', 'InProgress')
        RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
