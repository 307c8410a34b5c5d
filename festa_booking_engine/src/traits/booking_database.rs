use festa_common::Money;
use thiserror::Error;

use crate::{
    db_types::{Actor, NewOrder, NewPayment, Order, OrderStatusType, Payment, PaymentStatus},
    traits::{GatewayError, OrderManagement, PackageCatalog, PaymentLedger},
};

/// This trait defines the highest level of behaviour for backends supporting the booking engine.
///
/// This behaviour includes:
/// * Creating orders and recording deposit attempts atomically.
/// * Guarded order status transitions. Every transition is a single compare-and-set write, so two
///   racing requests can never both succeed.
/// * The composite webhook write: settling the ledger entry and marking the order paid in one
///   transaction.
///
/// All the guarded transition methods return `Ok(None)` when the order did not match the expected
/// status (or does not exist). Callers turn that into the appropriate
/// [`BookingError::InvalidTransition`] or [`BookingError::OrderNotFound`].
#[allow(async_fn_in_trait)]
pub trait BookingDatabase: Clone + OrderManagement + PaymentLedger + PackageCatalog {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Stores a new order with status `Pending`, a zero deposit and `remaining == total`.
    async fn insert_order(&self, order: NewOrder, total: Money) -> Result<Order, BookingError>;

    /// In a single atomic transaction:
    /// * refreshes the order's amount split (`total`/`deposit`/`remaining`), guarded on the order
    ///   still being `Pending`, and
    /// * records the `Pending` deposit ledger entry carrying the gateway correlation ids.
    ///
    /// If the order misses its guard the whole transaction is rolled back and an
    /// `InvalidTransition` error is returned, so a gateway session is never referenced by a
    /// half-written attempt.
    async fn record_deposit_attempt(
        &self,
        order_id: i64,
        total: Money,
        deposit: Money,
        remaining: Money,
        payment: NewPayment,
    ) -> Result<(Order, Payment), BookingError>;

    /// In a single atomic transaction, moves the deposit ledger entry `Pending → Success` (storing
    /// the gateway transaction id and raw response) and the order `Pending → Paid`.
    ///
    /// The ledger write is authoritative. If the order no longer matches the `Pending` guard the
    /// payment settlement still commits and `None` is returned for the order, leaving the
    /// inconsistency to reconciliation tooling.
    async fn confirm_deposit(
        &self,
        payment_id: i64,
        gateway_txn_id: Option<String>,
        response_data: Option<String>,
    ) -> Result<(Payment, Option<Order>), BookingError>;

    /// `Paid → Accepted`, setting `accepted_at`.
    async fn accept_order(&self, order_id: i64) -> Result<Option<Order>, BookingError>;

    /// `Accepted → InProgress`.
    async fn start_order_progress(&self, order_id: i64) -> Result<Option<Order>, BookingError>;

    /// `Accepted | InProgress → Completed`, recording who completed the order.
    async fn complete_order(&self, order_id: i64, completed_by: &Actor) -> Result<Option<Order>, BookingError>;

    /// Any non-terminal status `→ Rejected`, recording who rejected the order.
    async fn reject_order(&self, order_id: i64, rejected_by: &Actor) -> Result<Option<Order>, BookingError>;

    /// `Pending | Paid → Cancelled`, setting `cancelled_at`.
    async fn cancel_order(&self, order_id: i64) -> Result<Option<Order>, BookingError>;

    /// Soft delete: sets `deleted_at`, guarded on the order not being `Paid`, `Accepted` or
    /// `InProgress`. Deleted orders disappear from every fetch and listing.
    async fn soft_delete_order(&self, order_id: i64) -> Result<Option<Order>, BookingError>;

    /// Writes a refund ledger row with status `Refunded`. At most one refund may exist per order;
    /// a second write fails with [`BookingError::RefundUnavailable`].
    async fn record_refund(&self, refund: NewPayment) -> Result<Payment, BookingError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), BookingError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("The requested package {0} does not exist")]
    PackageNotFound(i64),
    #[error("{actor} is not permitted to perform this action")]
    Forbidden { actor: Actor },
    #[error("Order {order_id} is {status} and cannot transition to {target}")]
    InvalidTransition { order_id: i64, status: OrderStatusType, target: OrderStatusType },
    #[error("Order {order_id} is {status} and cannot be deleted")]
    DeleteBlocked { order_id: i64, status: OrderStatusType },
    #[error("Ledger entry {payment_id} is {status} and cannot move to {target}")]
    InvalidLedgerTransition { payment_id: i64, status: PaymentStatus, target: PaymentStatus },
    #[error("No refund is possible: {0}")]
    RefundUnavailable(String),
    #[error("The payment gateway is unavailable: {0}")]
    GatewayUnavailable(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::DatabaseError(e.to_string())
    }
}

impl From<GatewayError> for BookingError {
    fn from(e: GatewayError) -> Self {
        BookingError::GatewayUnavailable(e.to_string())
    }
}
