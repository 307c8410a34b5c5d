//! `SqliteDatabase` is a concrete implementation of a booking engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use festa_common::Money;
use log::*;
use sqlx::{Error as SqlxError, SqliteConnection, SqlitePool};

use super::db::{new_pool, orders, packages, payments};
use crate::{
    db_types::{Actor, GatewayKind, NewOrder, NewPayment, Order, OrderStatusType, Package, Payment, PaymentStatus},
    order_objects::OrderQueryFilter,
    traits::{BookingDatabase, BookingError, OrderManagement, PackageCatalog, PaymentLedger},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqlxError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Builds the error for a ledger compare-and-set that matched no row.
async fn ledger_transition_failed(
    payment_id: i64,
    target: PaymentStatus,
    conn: &mut SqliteConnection,
) -> BookingError {
    match payments::fetch_payment_by_id(payment_id, conn).await {
        Ok(Some(payment)) => BookingError::InvalidLedgerTransition { payment_id, status: payment.status, target },
        Ok(None) => BookingError::PaymentNotFound(payment_id),
        Err(e) => e.into(),
    }
}

impl BookingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, total: Money) -> Result<Order, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(&order, total, &mut conn).await?;
        debug!("🗃️ {order} has been saved in the DB");
        Ok(order)
    }

    async fn record_deposit_attempt(
        &self,
        order_id: i64,
        total: Money,
        deposit: Money,
        remaining: Money,
        payment: NewPayment,
    ) -> Result<(Order, Payment), BookingError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::set_deposit_split(order_id, total, deposit, remaining, &mut tx).await? {
            Some(order) => order,
            None => {
                return Err(match orders::fetch_order_by_id(order_id, &mut tx).await? {
                    Some(order) => BookingError::InvalidTransition {
                        order_id,
                        status: order.status,
                        target: OrderStatusType::Paid,
                    },
                    None => BookingError::OrderNotFound(order_id),
                });
            },
        };
        let payment = payments::insert_attempt(&payment, &mut tx).await?;
        debug!("🗃️ Deposit attempt {} recorded for order #{order_id}", payment.id);
        tx.commit().await?;
        Ok((order, payment))
    }

    async fn confirm_deposit(
        &self,
        payment_id: i64,
        gateway_txn_id: Option<String>,
        response_data: Option<String>,
    ) -> Result<(Payment, Option<Order>), BookingError> {
        let mut tx = self.pool.begin().await?;
        let txn_id = gateway_txn_id.as_deref();
        let payment = match payments::mark_success(payment_id, txn_id, response_data.as_deref(), &mut tx).await {
            Ok(Some(payment)) => payment,
            Ok(None) => return Err(ledger_transition_failed(payment_id, PaymentStatus::Success, &mut tx).await),
            // The single-success-deposit index fires when another attempt for the same order has
            // already settled.
            Err(SqlxError::Database(de)) if de.is_unique_violation() => {
                return Err(BookingError::InvalidLedgerTransition {
                    payment_id,
                    status: PaymentStatus::Pending,
                    target: PaymentStatus::Success,
                });
            },
            Err(e) => return Err(e.into()),
        };
        let order = orders::mark_paid(payment.order_id, &mut tx).await?;
        if order.is_none() {
            error!(
                "🗃️ Payment {payment_id} settled but order #{} missed its Pending guard. The ledger entry is \
                 committed anyway; the order needs operator attention.",
                payment.order_id
            );
        }
        tx.commit().await?;
        Ok((payment, order))
    }

    async fn accept_order(&self, order_id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::accept_order(order_id, &mut conn).await?)
    }

    async fn start_order_progress(&self, order_id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::start_progress(order_id, &mut conn).await?)
    }

    async fn complete_order(&self, order_id: i64, completed_by: &Actor) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::complete_order(order_id, completed_by, &mut conn).await?)
    }

    async fn reject_order(&self, order_id: i64, rejected_by: &Actor) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::reject_order(order_id, rejected_by, &mut conn).await?)
    }

    async fn cancel_order(&self, order_id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::cancel_order(order_id, &mut conn).await?)
    }

    async fn soft_delete_order(&self, order_id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::soft_delete_order(order_id, &mut conn).await?)
    }

    async fn record_refund(&self, refund: NewPayment) -> Result<Payment, BookingError> {
        let mut conn = self.pool.acquire().await?;
        match payments::insert_refund(&refund, &mut conn).await {
            Ok(payment) => {
                debug!("🗃️ Refund {} recorded for order #{}", payment.id, payment.order_id);
                Ok(payment)
            },
            Err(SqlxError::Database(de)) if de.is_unique_violation() => Err(BookingError::RefundUnavailable(format!(
                "a refund has already been recorded for order {}",
                refund.order_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&mut self) -> Result<(), BookingError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(order_id, &mut conn).await?)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_buyer(buyer_id, &mut conn).await?)
    }

    async fn fetch_orders_for_provider(&self, provider_id: i64) -> Result<Vec<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_provider(provider_id, &mut conn).await?)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(query, &mut conn).await?)
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn record_payment_attempt(&self, payment: NewPayment) -> Result<Payment, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::insert_attempt(&payment, &mut conn).await?)
    }

    async fn mark_payment_success(
        &self,
        payment_id: i64,
        gateway_txn_id: Option<String>,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let txn_id = gateway_txn_id.as_deref();
        match payments::mark_success(payment_id, txn_id, response_data.as_deref(), &mut conn).await {
            Ok(Some(payment)) => Ok(payment),
            Ok(None) => Err(ledger_transition_failed(payment_id, PaymentStatus::Success, &mut conn).await),
            Err(SqlxError::Database(de)) if de.is_unique_violation() => Err(BookingError::InvalidLedgerTransition {
                payment_id,
                status: PaymentStatus::Pending,
                target: PaymentStatus::Success,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_payment_failed(
        &self,
        payment_id: i64,
        reason: &str,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError> {
        let mut conn = self.pool.acquire().await?;
        match payments::mark_failed(payment_id, reason, response_data.as_deref(), &mut conn).await? {
            Some(payment) => Ok(payment),
            None => Err(ledger_transition_failed(payment_id, PaymentStatus::Failed, &mut conn).await),
        }
    }

    async fn mark_payment_refunded(
        &self,
        payment_id: i64,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError> {
        let mut conn = self.pool.acquire().await?;
        match payments::mark_refunded(payment_id, response_data.as_deref(), &mut conn).await? {
            Some(payment) => Ok(payment),
            None => Err(ledger_transition_failed(payment_id, PaymentStatus::Refunded, &mut conn).await),
        }
    }

    async fn fetch_payment_by_id(&self, payment_id: i64) -> Result<Option<Payment>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_id(payment_id, &mut conn).await?)
    }

    async fn fetch_pending_deposit_for_gateway_order(
        &self,
        gateway: GatewayKind,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_pending_deposit_for_gateway_order(gateway, gateway_order_id, &mut conn).await?)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_payments_for_buyer(&self, buyer_id: i64) -> Result<Vec<Payment>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_buyer(buyer_id, &mut conn).await?)
    }

    async fn fetch_successful_deposit(&self, order_id: i64) -> Result<Option<Payment>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_successful_deposit(order_id, &mut conn).await?)
    }

    async fn refund_exists_for_order(&self, order_id: i64) -> Result<bool, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::refund_exists(order_id, &mut conn).await?)
    }
}

impl PackageCatalog for SqliteDatabase {
    async fn fetch_package(&self, package_id: i64) -> Result<Option<Package>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(packages::fetch_package(package_id, &mut conn).await?)
    }
}
