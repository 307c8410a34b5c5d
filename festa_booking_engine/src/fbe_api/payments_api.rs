use crate::{
    db_types::{Actor, Payment, PaymentStatus, PaymentType},
    payment_objects::PaymentHistory,
    traits::{BookingError, OrderManagement, PaymentLedger},
};

/// The read side of the payment ledger. Ledger entries inherit their visibility from the order
/// they belong to.
pub struct PaymentsApi<B> {
    db: B,
}

impl<B> PaymentsApi<B>
where B: PaymentLedger + OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The full ledger for one order, oldest entry first. Owners and admins only.
    pub async fn payments_for_order(&self, actor: &Actor, order_id: i64) -> Result<Vec<Payment>, BookingError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(BookingError::OrderNotFound(order_id))?;
        if !order.is_visible_to(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        self.db.fetch_payments_for_order(order_id).await
    }

    /// The acting buyer's payment history, with running totals for settled deposits and refunds.
    pub async fn my_payments(&self, actor: &Actor) -> Result<PaymentHistory, BookingError> {
        let payments = self.db.fetch_payments_for_buyer(actor.id).await?;
        let total_paid = payments
            .iter()
            .filter(|p| p.payment_type == PaymentType::Deposit && matches!(p.status, PaymentStatus::Success | PaymentStatus::Refunded))
            .map(|p| p.amount)
            .sum();
        let total_refunded =
            payments.iter().filter(|p| p.payment_type == PaymentType::Refund).map(|p| p.amount).sum();
        Ok(PaymentHistory { buyer_id: actor.id, total_paid, total_refunded, payments })
    }

    /// Admin-only fetch of a single ledger entry.
    pub async fn fetch_payment(&self, actor: &Actor, payment_id: i64) -> Result<Payment, BookingError> {
        if !actor.is_admin() {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        self.db.fetch_payment_by_id(payment_id).await?.ok_or(BookingError::PaymentNotFound(payment_id))
    }
}
