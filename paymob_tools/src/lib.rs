//! A thin client for the Paymob "Accept" HTTP API.
//!
//! Payment collection is a three-step dance: exchange the configured API key for a short-lived auth
//! token, register an order on Paymob's side, then create a payment key that unlocks the hosted
//! payment iframe. [`PaymobApi::create_checkout`] runs the full sequence. Refunds go through the
//! void/refund endpoint and are best-effort from the caller's point of view.
//!
//! All amounts cross this boundary as integer minor units (cents).

mod api;
mod config;
mod error;

mod data_objects;

pub use api::{PaymobApi, PAYMENT_KEY_EXPIRY_SECS};
pub use config::{PaymobConfig, DEFAULT_PAYMOB_BASE_URL};
pub use data_objects::{
    AuthTokenResponse,
    BillingData,
    CallbackPayload,
    CheckoutSession,
    OrderItem,
    PaymentKeyRequest,
    PaymentKeyResponse,
    PaymobOrderRequest,
};
pub use error::PaymobApiError;
