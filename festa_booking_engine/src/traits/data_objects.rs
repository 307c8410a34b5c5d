use chrono::{DateTime, Utc};
use festa_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::GatewayKind;

/// Everything the gateway hands back when a deposit session is created. The correlation ids are
/// what later webhook callbacks are matched against; the payload fields are kept for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositSession {
    /// The gateway's own id for this payment session.
    pub gateway_order_id: String,
    /// Short-lived intent token the buyer's checkout page is built from.
    pub payment_token: String,
    /// Where to send the buyer to complete the payment.
    pub checkout_url: String,
    pub expires_at: DateTime<Utc>,
    /// Serialized request payload, kept for audit.
    pub request_data: Option<String>,
    /// Serialized gateway response, kept for audit.
    pub response_data: Option<String>,
}

/// The gateway's acknowledgment of a refund request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundAck {
    pub response_data: Option<String>,
}

/// A gateway payment callback, normalized from whatever wire format the gateway uses. This is what
/// the reconciler consumes.
#[derive(Debug, Clone)]
pub struct PaymentCallback {
    pub gateway: GatewayKind,
    /// The gateway-side order id the callback refers to.
    pub gateway_order_id: String,
    pub success: bool,
    pub amount: Money,
    /// The gateway-side transaction id, when the gateway supplied one.
    pub gateway_txn_id: Option<String>,
    /// The raw callback body, stored on the ledger entry for audit.
    pub raw_payload: String,
}

impl PaymentCallback {
    pub fn new(gateway_order_id: impl Into<String>, success: bool, amount: Money) -> Self {
        Self {
            gateway: GatewayKind::default(),
            gateway_order_id: gateway_order_id.into(),
            success,
            amount,
            gateway_txn_id: None,
            raw_payload: String::new(),
        }
    }

    pub fn with_txn_id(mut self, txn_id: impl Into<String>) -> Self {
        self.gateway_txn_id = Some(txn_id.into());
        self
    }

    pub fn with_raw_payload(mut self, raw: impl Into<String>) -> Self {
        self.raw_payload = raw.into();
        self
    }
}
