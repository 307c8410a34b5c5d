//! The public API for the booking engine.
//!
//! [`order_flow_api::OrderFlowApi`] owns every order transition and the webhook reconciliation.
//! [`orders_api::OrdersApi`] and [`payments_api::PaymentsApi`] are the read side used by the HTTP
//! surface, enforcing the owners-or-admin visibility rules.
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
pub mod payment_objects;
pub mod payments_api;
