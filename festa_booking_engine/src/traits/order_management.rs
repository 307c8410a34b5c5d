use crate::{
    db_types::Order,
    order_objects::OrderQueryFilter,
    traits::BookingError,
};

/// Query methods for orders. Soft-deleted orders are invisible to every method here.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, BookingError>;

    /// All orders placed by the given buyer, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, BookingError>;

    /// The orders a provider needs to act on: those with a confirmed deposit or later
    /// (`Paid`, `Accepted`, `InProgress`, `Completed`), newest first. Unpaid orders are not the
    /// provider's business yet.
    async fn fetch_orders_for_provider(&self, provider_id: i64) -> Result<Vec<Order>, BookingError>;

    /// Admin search across all orders.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, BookingError>;
}
