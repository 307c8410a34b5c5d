use chrono::{DateTime, Utc};
use festa_common::CURRENCY_CODE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub amount_cents: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymobOrderRequest {
    pub auth_token: String,
    pub delivery_needed: bool,
    pub amount_cents: i64,
    pub currency: String,
    pub merchant_order_id: String,
    pub items: Vec<OrderItem>,
}

impl PaymobOrderRequest {
    pub fn new(auth_token: &str, merchant_order_id: &str, amount_cents: i64, description: &str) -> Self {
        Self {
            auth_token: auth_token.to_string(),
            delivery_needed: false,
            amount_cents,
            currency: CURRENCY_CODE.to_string(),
            merchant_order_id: merchant_order_id.to_string(),
            items: vec![OrderItem { name: description.to_string(), amount_cents, quantity: 1 }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentKeyRequest {
    pub auth_token: String,
    pub amount_cents: i64,
    pub expiration: u32,
    pub order_id: i64,
    pub billing_data: BillingData,
    pub currency: String,
    pub integration_id: String,
    pub lock_order_when_paid: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentKeyResponse {
    pub token: String,
}

/// Paymob requires every billing field to be present, so absent details are filled with `N/A`
/// placeholders rather than omitted.
#[derive(Debug, Clone, Serialize)]
pub struct BillingData {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub country: String,
    pub apartment: String,
    pub floor: String,
    pub postal_code: String,
    pub state: String,
}

impl Default for BillingData {
    fn default() -> Self {
        let na = || "N/A".to_string();
        Self {
            first_name: na(),
            last_name: na(),
            phone_number: na(),
            email: na(),
            street: na(),
            city: na(),
            country: "EG".to_string(),
            apartment: na(),
            floor: na(),
            postal_code: na(),
            state: na(),
        }
    }
}

/// The result of a completed checkout handshake (auth token + remote order + payment key).
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub remote_order_id: i64,
    pub payment_token: String,
    pub iframe_url: String,
    pub expires_at: DateTime<Utc>,
    /// Raw order-registration response, kept for the audit trail. The short-lived tokens are
    /// deliberately not part of it.
    pub order_response: Value,
}

/// Transaction-processed callback. Paymob posts a large blob; only these fields drive
/// reconciliation, and the absence of any required one is a parse error. `order_id` is Paymob's
/// own order id, not ours.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    pub order_id: i64,
    pub success: bool,
    pub amount_cents: i64,
    #[serde(default)]
    pub transaction_id: Option<i64>,
}
