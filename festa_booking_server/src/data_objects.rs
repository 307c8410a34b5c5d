use std::fmt::Display;

use chrono::NaiveDate;
use festa_booking_engine::db_types::{NewOrder, Order, Payment};
use serde::{Deserialize, Serialize};

/// The body of a `POST /api/orders` request.
///
/// `buyer_id` is normally omitted; the acting buyer books for themselves. Admins supply it to
/// create an order on a buyer's behalf. The engine rejects a buyer naming anyone but themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderParams {
    #[serde(default)]
    pub buyer_id: Option<i64>,
    pub provider_id: i64,
    pub package_id: i64,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewOrderParams {
    /// Builds the engine order, filling the buyer in from the request identity when the body
    /// leaves it out.
    pub fn into_new_order(self, default_buyer_id: i64) -> NewOrder {
        let mut order = NewOrder::new(
            self.buyer_id.unwrap_or(default_buyer_id),
            self.provider_id,
            self.package_id,
            self.event_date,
        );
        order.latitude = self.latitude;
        order.longitude = self.longitude;
        order.address = self.address;
        order.notes = self.notes;
        order
    }
}

/// Returned by the reject and cancel endpoints: the closed order, plus the refund ledger entry
/// when one was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedOrderResult {
    pub order: Order,
    pub refund: Option<Payment>,
}

/// The envelope for webhook acknowledgements and other fire-and-forget responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
