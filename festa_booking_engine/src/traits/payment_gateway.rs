use festa_common::Money;
use thiserror::Error;

use crate::{
    db_types::{GatewayKind, Order},
    traits::data_objects::{DepositSession, RefundAck},
};

/// The engine's view of the external payment processor.
///
/// The server supplies the Paymob-backed implementation; engine tests supply stubs. Keeping the
/// trait this narrow means the engine never depends on HTTP client code and the gateway can be
/// swapped without touching the order flow.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Which processor this implementation talks to. Recorded on every ledger entry.
    fn kind(&self) -> GatewayKind;

    /// Creates a remote payment session for the given deposit amount: a gateway-side order, a
    /// short-lived payment intent token and the checkout URL the buyer is sent to.
    ///
    /// The gateway offers no idempotency here, so callers must persist the correlation ids from the
    /// returned session before asking for another one.
    async fn create_deposit_session(&self, order: &Order, amount: Money) -> Result<DepositSession, GatewayError>;

    /// Asks the gateway to refund a previously settled transaction. Best-effort: callers record
    /// the refund locally whether or not this call succeeds.
    async fn request_refund(&self, gateway_txn_id: &str, amount: Money) -> Result<RefundAck, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("The payment gateway returned an unusable response: {0}")]
    InvalidResponse(String),
}
