//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the booking engine database
//! *backends*, plus the seam to the external payment gateway.
//!
//! ## Traits
//!
//! * [`BookingDatabase`] defines the highest level of behaviour for backends supporting the booking
//!   engine: atomic order inserts, guarded status transitions and the composite deposit/refund
//!   writes that must happen inside one transaction.
//! * [`OrderManagement`] provides methods for querying orders.
//! * [`PaymentLedger`] provides the append-safe ledger contract: rows are created `Pending` and may
//!   only ever move `Pending → Success`, `Pending → Failed` or `Success → Refunded`.
//! * [`PackageCatalog`] is the read-only window onto the package catalog (price by package id).
//! * [`PaymentGateway`] abstracts the external payment processor so the engine never links against
//!   HTTP client code.
mod booking_database;
mod data_objects;
mod order_management;
mod package_catalog;
mod payment_gateway;
mod payment_ledger;

pub use booking_database::{BookingDatabase, BookingError};
pub use data_objects::{DepositSession, PaymentCallback, RefundAck};
pub use order_management::OrderManagement;
pub use package_catalog::PackageCatalog;
pub use payment_gateway::{GatewayError, PaymentGateway};
pub use payment_ledger::PaymentLedger;
