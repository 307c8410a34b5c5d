//! The Paymob-backed implementation of the engine's [`PaymentGateway`] seam.
//!
//! The engine never sees HTTP. This module owns the translation in both directions: deposit
//! sessions and refunds go out through [`paymob_tools::PaymobApi`], and parsed webhook payloads
//! come back in as gateway-neutral [`PaymentCallback`]s.
use festa_booking_engine::{
    db_types::{GatewayKind, Order},
    traits::{DepositSession, GatewayError, PaymentCallback, PaymentGateway, RefundAck},
};
use festa_common::Money;
use paymob_tools::{BillingData, CallbackPayload, PaymobApi, PaymobApiError, PaymobConfig};
use serde_json::json;

#[derive(Clone)]
pub struct PaymobGateway {
    api: PaymobApi,
}

impl PaymobGateway {
    pub fn new(config: PaymobConfig) -> Result<Self, PaymobApiError> {
        let api = PaymobApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for PaymobGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Paymob
    }

    async fn create_deposit_session(&self, order: &Order, amount: Money) -> Result<DepositSession, GatewayError> {
        let merchant_order_id = order.id.to_string();
        let description = format!("Deposit for booking #{}", order.id);
        let session = self
            .api
            .create_checkout(&merchant_order_id, amount.cents(), &description, BillingData::default())
            .await
            .map_err(gateway_error)?;
        let request_data = json!({ "merchant_order_id": merchant_order_id, "amount_cents": amount.cents() });
        Ok(DepositSession {
            gateway_order_id: session.remote_order_id.to_string(),
            payment_token: session.payment_token,
            checkout_url: session.iframe_url,
            expires_at: session.expires_at,
            request_data: Some(request_data.to_string()),
            response_data: Some(session.order_response.to_string()),
        })
    }

    async fn request_refund(&self, gateway_txn_id: &str, amount: Money) -> Result<RefundAck, GatewayError> {
        let response = self.api.refund_transaction(gateway_txn_id, amount.cents()).await.map_err(gateway_error)?;
        Ok(RefundAck { response_data: Some(response.to_string()) })
    }
}

/// Normalizes a parsed Paymob callback into the engine's gateway-neutral form. The raw body rides
/// along so the ledger keeps it for audit.
pub fn callback_from_payload(payload: CallbackPayload, raw: &str) -> PaymentCallback {
    let mut callback = PaymentCallback::new(payload.order_id.to_string(), payload.success, Money::from_cents(payload.amount_cents))
        .with_raw_payload(raw);
    if let Some(txn_id) = payload.transaction_id {
        callback = callback.with_txn_id(txn_id.to_string());
    }
    callback
}

fn gateway_error(e: PaymobApiError) -> GatewayError {
    match e {
        PaymobApiError::Initialization(s) | PaymobApiError::RequestError(s) => GatewayError::Unavailable(s),
        PaymobApiError::QueryError { status, message } => GatewayError::Rejected(format!("HTTP {status}. {message}")),
        PaymobApiError::JsonError(s) | PaymobApiError::UnexpectedResponse(s) => GatewayError::InvalidResponse(s),
    }
}
