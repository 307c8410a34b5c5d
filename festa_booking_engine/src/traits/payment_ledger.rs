use crate::{
    db_types::{GatewayKind, NewPayment, Payment},
    traits::BookingError,
};

/// The append-safe payment ledger contract.
///
/// Rows are only ever created, never re-purposed, and a row's status may only move
/// `Pending → Success`, `Pending → Failed` or `Success → Refunded`. Every mutation here is a single
/// status-guarded compare-and-set, so a duplicate webhook replay loses the race cleanly with an
/// [`BookingError::InvalidLedgerTransition`] instead of double-settling.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger {
    /// Stores a new ledger entry with status `Pending`.
    async fn record_payment_attempt(&self, payment: NewPayment) -> Result<Payment, BookingError>;

    /// `Pending → Success`, storing the gateway transaction id and raw response when supplied.
    async fn mark_payment_success(
        &self,
        payment_id: i64,
        gateway_txn_id: Option<String>,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError>;

    /// `Pending → Failed`, storing the failure reason and raw response.
    async fn mark_payment_failed(
        &self,
        payment_id: i64,
        reason: &str,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError>;

    /// `Success → Refunded`, setting `refunded_at`.
    async fn mark_payment_refunded(
        &self,
        payment_id: i64,
        response_data: Option<String>,
    ) -> Result<Payment, BookingError>;

    async fn fetch_payment_by_id(&self, payment_id: i64) -> Result<Option<Payment>, BookingError>;

    /// Looks up the `Pending` deposit attempt that a gateway callback refers to, by the gateway's
    /// own order id. Settled attempts do not match, which is what makes replays no-ops.
    async fn fetch_pending_deposit_for_gateway_order(
        &self,
        gateway: GatewayKind,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, BookingError>;

    /// The full ledger for one order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, BookingError>;

    /// A buyer's payment history across all their orders, newest first.
    async fn fetch_payments_for_buyer(&self, buyer_id: i64) -> Result<Vec<Payment>, BookingError>;

    /// The unique `Success` deposit for an order, if one exists.
    async fn fetch_successful_deposit(&self, order_id: i64) -> Result<Option<Payment>, BookingError>;

    /// Whether a refund row has already been recorded for the order.
    async fn refund_exists_for_order(&self, order_id: i64) -> Result<bool, BookingError>;
}
