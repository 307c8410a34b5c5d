//! Adapters between external service clients and the engine's seams.
pub mod paymob;
