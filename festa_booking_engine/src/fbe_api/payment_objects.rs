use std::fmt::Display;

use chrono::{DateTime, Utc};
use festa_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// The response to a deposit request: the refreshed order, the `Pending` ledger entry, and
/// everything the buyer needs to complete the payment on the gateway's checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDepositResult {
    pub order: Order,
    pub payment: Payment,
    pub checkout_url: String,
    pub payment_token: String,
    pub expires_at: DateTime<Utc>,
}

/// The response to `fetch_payments_for_buyer` calls. The array of ledger entries is included along
/// with what the buyer has paid in settled deposits and what has flowed back as refunds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub buyer_id: i64,
    pub total_paid: Money,
    pub total_refunded: Money,
    pub payments: Vec<Payment>,
}

/// What a gateway callback ended up doing.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The deposit settled and, unless it lost the race documented on
    /// [`crate::traits::BookingDatabase::confirm_deposit`], the order is now `Paid`.
    Confirmed { payment: Payment, order: Option<Order> },
    /// The gateway reported a failed payment; the order stays `Pending` and the buyer may retry.
    MarkedFailed(Payment),
    /// Nothing actionable matched the callback. Either the gateway order id is unknown or the
    /// attempt was already settled by an earlier delivery.
    Unmatched,
}

impl Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileOutcome::Confirmed { payment, order: Some(order) } => {
                write!(f, "payment {} confirmed; order #{} is now {}", payment.id, order.id, order.status)
            },
            ReconcileOutcome::Confirmed { payment, order: None } => {
                write!(f, "payment {} confirmed; order #{} was left as-is", payment.id, payment.order_id)
            },
            ReconcileOutcome::MarkedFailed(payment) => {
                write!(f, "payment {} marked failed for order #{}", payment.id, payment.order_id)
            },
            ReconcileOutcome::Unmatched => write!(f, "no matching pending deposit"),
        }
    }
}
