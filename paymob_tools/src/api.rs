use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::PaymobConfig,
    data_objects::{BillingData, CheckoutSession, PaymentKeyRequest, PaymentKeyResponse, PaymobOrderRequest},
    AuthTokenResponse,
    PaymobApiError,
};

/// Paymob payment keys are valid for one hour.
pub const PAYMENT_KEY_EXPIRY_SECS: u32 = 3600;

#[derive(Clone)]
pub struct PaymobApi {
    config: PaymobConfig,
    client: Arc<Client>,
}

impl PaymobApi {
    pub fn new(config: PaymobConfig) -> Result<Self, PaymobApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymobApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaymobConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn post_query<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, PaymobApiError> {
        let url = self.url(path);
        trace!("Sending POST query: {url}");
        let mut req = self.client.request(Method::POST, url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let response = req.send().await.map_err(|e| PaymobApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("POST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaymobApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaymobApiError::RequestError(e.to_string()))?;
            Err(PaymobApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// The hosted payment page for a payment key created by [`create_payment_key`].
    pub fn iframe_url(&self, payment_token: &str) -> String {
        format!("{}/acceptance/iframes/{}?payment_token={payment_token}", self.config.base_url, self.config.iframe_id)
    }

    /// Exchanges the configured API key for a short-lived bearer token.
    pub async fn authenticate(&self) -> Result<String, PaymobApiError> {
        let body = serde_json::json!({ "api_key": self.config.api_key.reveal() });
        debug!("Requesting Paymob auth token");
        let response: AuthTokenResponse = self.post_query("/auth/tokens", &body, None).await?;
        info!("Paymob auth token obtained");
        Ok(response.token)
    }

    /// Registers an order on Paymob's side and returns its raw response. Paymob does not
    /// de-duplicate these, so never call this twice for the same local payment attempt.
    pub async fn create_order(
        &self,
        auth_token: &str,
        merchant_order_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<Value, PaymobApiError> {
        let body = PaymobOrderRequest::new(auth_token, merchant_order_id, amount_cents, description);
        debug!("Registering Paymob order for local order #{merchant_order_id}");
        let response: Value = self.post_query("/ecommerce/orders", &body, Some(auth_token)).await?;
        let remote_id = remote_order_id(&response)?;
        info!("Paymob order created: {remote_id}");
        Ok(response)
    }

    /// Creates the payment key (intent token) that unlocks the hosted iframe for one hour.
    pub async fn create_payment_key(
        &self,
        auth_token: &str,
        remote_order_id: i64,
        amount_cents: i64,
        billing_data: BillingData,
    ) -> Result<String, PaymobApiError> {
        let body = PaymentKeyRequest {
            auth_token: auth_token.to_string(),
            amount_cents,
            expiration: PAYMENT_KEY_EXPIRY_SECS,
            order_id: remote_order_id,
            billing_data,
            currency: festa_common::CURRENCY_CODE.to_string(),
            integration_id: self.config.integration_id.clone(),
            lock_order_when_paid: false,
        };
        debug!("Creating payment key for Paymob order {remote_order_id}");
        let response: PaymentKeyResponse = self.post_query("/acceptance/payment_keys", &body, Some(auth_token)).await?;
        info!("Payment key created for Paymob order {remote_order_id}");
        Ok(response.token)
    }

    /// Runs the full checkout handshake: authenticate, register the remote order, create the
    /// payment key, and assemble the iframe URL.
    pub async fn create_checkout(
        &self,
        merchant_order_id: &str,
        amount_cents: i64,
        description: &str,
        billing_data: BillingData,
    ) -> Result<CheckoutSession, PaymobApiError> {
        let auth_token = self.authenticate().await?;
        let order_response = self.create_order(&auth_token, merchant_order_id, amount_cents, description).await?;
        let remote_order_id = remote_order_id(&order_response)?;
        let payment_token = self.create_payment_key(&auth_token, remote_order_id, amount_cents, billing_data).await?;
        let expires_at = Utc::now() + chrono::Duration::seconds(i64::from(PAYMENT_KEY_EXPIRY_SECS));
        Ok(CheckoutSession {
            remote_order_id,
            iframe_url: self.iframe_url(&payment_token),
            payment_token,
            expires_at,
            order_response,
        })
    }

    /// Requests a refund against a previously captured transaction. Returns Paymob's raw response
    /// so callers can file it in the audit trail.
    pub async fn refund_transaction(&self, transaction_id: &str, amount_cents: i64) -> Result<Value, PaymobApiError> {
        let auth_token = self.authenticate().await?;
        let body = serde_json::json!({
            "auth_token": auth_token,
            "transaction_id": transaction_id,
            "amount_cents": amount_cents,
        });
        debug!("Requesting refund of {amount_cents} cents against transaction {transaction_id}");
        let response: Value = self.post_query("/acceptance/void_refund/refund", &body, Some(&auth_token)).await?;
        info!("Refund request for transaction {transaction_id} acknowledged");
        Ok(response)
    }
}

fn remote_order_id(response: &Value) -> Result<i64, PaymobApiError> {
    response["id"].as_i64().ok_or_else(|| PaymobApiError::UnexpectedResponse("order response has no id".to_string()))
}
