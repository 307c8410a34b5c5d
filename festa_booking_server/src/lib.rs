//! # Festa booking server
//! This module hosts the HTTP surface of the Festa marketplace backend. It is responsible for:
//! Resolving the caller's identity from the gateway-injected headers.
//! Enforcing per-route role access, then delegating to the booking engine.
//! Listening for payment callbacks from Paymob and feeding them to the reconciler.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/*`: The order, deposit and payment ledger routes. All of these require identity headers.
//! * `/webhooks/paymob`: The transaction-processed callback route for Paymob.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod paymob_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
