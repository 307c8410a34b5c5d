use sqlx::{Error as SqlxError, SqliteConnection};

use crate::db_types::{GatewayKind, NewPayment, Payment};

/// Inserts a new ledger entry with status `Pending`.
pub async fn insert_attempt(payment: &NewPayment, conn: &mut SqliteConnection) -> Result<Payment, SqlxError> {
    let payment = sqlx::query_as(
        r#"INSERT INTO payments (
            order_id, payment_type, status, gateway, amount, gateway_txn_id, gateway_order_id,
            request_data, response_data, error_message
        ) VALUES ($1, $2, 'Pending', $3, $4, $5, $6, $7, $8, $9)
        RETURNING *"#,
    )
    .bind(payment.order_id)
    .bind(payment.payment_type.to_string())
    .bind(payment.gateway.to_string())
    .bind(payment.amount)
    .bind(payment.gateway_txn_id.as_deref())
    .bind(payment.gateway_order_id.as_deref())
    .bind(payment.request_data.as_deref())
    .bind(payment.response_data.as_deref())
    .bind(payment.error_message.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Inserts a refund row directly in its settled state. The unique refund-per-order index makes a
/// second insert fail with a unique violation, which the caller maps to its domain error.
pub async fn insert_refund(refund: &NewPayment, conn: &mut SqliteConnection) -> Result<Payment, SqlxError> {
    let payment = sqlx::query_as(
        r#"INSERT INTO payments (
            order_id, payment_type, status, gateway, amount, gateway_txn_id, gateway_order_id,
            request_data, response_data, error_message, refunded_at
        ) VALUES ($1, 'Refund', 'Refunded', $2, $3, $4, $5, $6, $7, $8, CURRENT_TIMESTAMP)
        RETURNING *"#,
    )
    .bind(refund.order_id)
    .bind(refund.gateway.to_string())
    .bind(refund.amount)
    .bind(refund.gateway_txn_id.as_deref())
    .bind(refund.gateway_order_id.as_deref())
    .bind(refund.request_data.as_deref())
    .bind(refund.response_data.as_deref())
    .bind(refund.error_message.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, SqlxError> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// A buyer's ledger entries across all their (non-deleted) orders, newest first.
pub async fn fetch_payments_for_buyer(buyer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, SqlxError> {
    let payments = sqlx::query_as(
        r#"SELECT p.* FROM payments p
        INNER JOIN orders o ON o.id = p.order_id
        WHERE o.buyer_id = $1 AND o.deleted_at IS NULL
        ORDER BY p.created_at DESC, p.id DESC"#,
    )
    .bind(buyer_id)
    .fetch_all(conn)
    .await?;
    Ok(payments)
}

/// The `Pending` deposit attempt a gateway callback refers to. Settled attempts do not match, so a
/// replayed callback finds nothing here.
pub async fn fetch_pending_deposit_for_gateway_order(
    gateway: GatewayKind,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as(
        r#"SELECT * FROM payments
        WHERE gateway = $1 AND gateway_order_id = $2 AND payment_type = 'Deposit' AND status = 'Pending'
        ORDER BY id DESC LIMIT 1"#,
    )
    .bind(gateway.to_string())
    .bind(gateway_order_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_successful_deposit(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as(
        "SELECT * FROM payments WHERE order_id = $1 AND payment_type = 'Deposit' AND status = 'Success'",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn refund_exists(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqlxError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = $1 AND payment_type = 'Refund'")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

// Status changes are compare-and-set on the current status, mirroring the order transition
// writers. A row that is not in the guarded status matches nothing and `None` comes back.

pub async fn mark_success(
    id: i64,
    gateway_txn_id: Option<&str>,
    response_data: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as(
        r#"UPDATE payments
        SET status = 'Success', gateway_txn_id = COALESCE($1, gateway_txn_id),
            response_data = COALESCE($2, response_data), updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'Pending'
        RETURNING *"#,
    )
    .bind(gateway_txn_id)
    .bind(response_data)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn mark_failed(
    id: i64,
    reason: &str,
    response_data: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as(
        r#"UPDATE payments
        SET status = 'Failed', error_message = $1, response_data = COALESCE($2, response_data),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'Pending'
        RETURNING *"#,
    )
    .bind(reason)
    .bind(response_data)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn mark_refunded(
    id: i64,
    response_data: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqlxError> {
    let payment = sqlx::query_as(
        r#"UPDATE payments
        SET status = 'Refunded', refunded_at = CURRENT_TIMESTAMP, response_data = COALESCE($1, response_data),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND status = 'Success'
        RETURNING *"#,
    )
    .bind(response_data)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
