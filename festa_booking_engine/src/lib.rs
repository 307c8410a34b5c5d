//! Festa Booking Engine
//!
//! The booking engine owns the order lifecycle for the Festa marketplace: orders move from `Pending`
//! through deposit payment, provider acceptance and execution, to completion, with cancellation and
//! rejection as the side exits. Every financial event (deposit attempts, confirmations, refunds) is
//! tracked in a payment ledger that is the single source of truth for money state.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and the SQLite backend). You should never need
//!    to access the database directly. Instead, use the public API provided by the engine. The
//!    exception is the data types used in the database. These are defined in the `db_types` module
//!    and are public.
//! 2. The engine public API ([`OrderFlowApi`], [`OrdersApi`], [`PaymentsApi`]). This provides the
//!    public-facing functionality of the engine. It is responsible for order transitions, deposit
//!    collection, webhook reconciliation and refunds. Specific backends need to implement the traits
//!    in [`mod@traits`] in order to act as a backend for the Festa Booking Server.
//!
//! The payment gateway itself (Paymob) is deliberately behind the narrow [`traits::PaymentGateway`]
//! trait so that the engine never links against HTTP client code and tests can substitute a stub.

pub mod db_types;
pub mod traits;

mod fbe_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use fbe_api::{
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrdersApi,
    payment_objects,
    payments_api::PaymentsApi,
};
pub use traits::{BookingDatabase, BookingError, GatewayError, OrderManagement, PackageCatalog, PaymentGateway, PaymentLedger};
