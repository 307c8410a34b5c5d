use crate::{
    db_types::{Actor, Order},
    order_objects::OrderQueryFilter,
    traits::{BookingError, OrderManagement},
};

/// The read side of the order store, with the owners-or-admin visibility rule applied.
pub struct OrdersApi<B> {
    db: B,
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches one order. Only the order's buyer, its provider, or an admin may see it.
    pub async fn fetch_order(&self, actor: &Actor, order_id: i64) -> Result<Order, BookingError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(BookingError::OrderNotFound(order_id))?;
        if !order.is_visible_to(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        Ok(order)
    }

    /// The acting buyer's own orders, newest first.
    pub async fn my_orders(&self, actor: &Actor) -> Result<Vec<Order>, BookingError> {
        self.db.fetch_orders_for_buyer(actor.id).await
    }

    /// The acting provider's orders with a confirmed deposit or later.
    pub async fn provider_orders(&self, actor: &Actor) -> Result<Vec<Order>, BookingError> {
        self.db.fetch_orders_for_provider(actor.id).await
    }

    /// Admin-only search across all orders.
    pub async fn search_orders(&self, actor: &Actor, query: OrderQueryFilter) -> Result<Vec<Order>, BookingError> {
        if !actor.is_admin() {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        self.db.search_orders(query).await
    }
}
