use chrono::{Duration, NaiveTime, Utc};
use log::*;

use crate::{
    db_types::{Actor, NewOrder, NewPayment, Order, OrderStatusType, Payment, Role},
    payment_objects::{NewDepositResult, ReconcileOutcome},
    traits::{BookingDatabase, BookingError, PaymentCallback, PaymentGateway},
};

/// How close to the event a buyer can still cancel and get the deposit back.
pub const CANCELLATION_REFUND_WINDOW_HOURS: i64 = 24;

/// `OrderFlowApi` is the single owner of order state. Every legal transition runs through here, and
/// nothing else writes order status or ledger rows.
///
/// The lifecycle:
///
/// | From | To | Who |
/// |---|---|---|
/// | `Pending` | `Paid` | gateway webhook, after a confirmed deposit |
/// | `Paid` | `Accepted` | the order's provider |
/// | `Accepted` | `InProgress` | the order's provider |
/// | `Accepted`, `InProgress` | `Completed` | the order's provider or buyer |
/// | `Pending`, `Paid` | `Cancelled` | the order's buyer |
/// | any non-terminal | `Rejected` | the order's provider, or an admin |
///
/// `Rejected`, `Completed` and `Cancelled` are terminal. Ownership is re-checked here on every
/// mutation, on top of whatever the HTTP layer already enforced; admins only bypass ownership where
/// the table above says so.
///
/// Every transition is written as a status-guarded compare-and-set. Two racing calls on the same
/// order resolve cleanly: one wins, the loser gets [`BookingError::InvalidTransition`].
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> OrderFlowApi<B, G>
where
    B: BookingDatabase,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }

    /// Returns a reference to the underlying database.
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    /// Creates a new order for the acting buyer.
    ///
    /// The order starts out `Pending` with a zero deposit; the total is read from the package
    /// catalog, never from the client. Admins may create orders on a buyer's behalf.
    pub async fn create_order(&self, actor: &Actor, order: NewOrder) -> Result<Order, BookingError> {
        if !actor.is_admin() && !(actor.role == Role::Buyer && actor.id == order.buyer_id) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        let total = self.db.package_price(order.package_id).await?;
        let order = self.db.insert_order(order, total).await?;
        info!("🔄️ {order} created");
        Ok(order)
    }

    /// Starts the deposit payment flow for a `Pending` order. Only the order's buyer can pay.
    ///
    /// In order:
    /// 1. The package price is re-read from the catalog, so the deposit is always 10% of the
    ///    *current* price and the order total is refreshed to match.
    /// 2. The gateway is asked for a payment session. If that fails, nothing has been written and
    ///    the whole call fails with [`BookingError::GatewayUnavailable`].
    /// 3. The amount split and the `Pending` deposit ledger entry are stored in one transaction,
    ///    guarded on the order still being `Pending`.
    ///
    /// The order stays `Pending` until the gateway confirms the payment through the webhook, so a
    /// buyer whose payment failed can simply request a new deposit session.
    pub async fn request_deposit(&self, actor: &Actor, order_id: i64) -> Result<NewDepositResult, BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !order.is_buyer(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        if order.status != OrderStatusType::Pending {
            return Err(BookingError::InvalidTransition {
                order_id,
                status: order.status,
                target: OrderStatusType::Paid,
            });
        }
        let total = self.db.package_price(order.package_id).await?;
        let deposit = total.percent(10);
        let remaining = total - deposit;
        let session = self.gateway.create_deposit_session(&order, deposit).await.map_err(|e| {
            warn!("🔄️ Could not create a deposit session for order #{order_id}: {e}");
            BookingError::from(e)
        })?;
        let mut payment = NewPayment::deposit(order.id, deposit)
            .with_gateway_order_id(session.gateway_order_id.clone());
        payment.gateway = self.gateway.kind();
        payment.request_data = session.request_data.clone();
        payment.response_data = session.response_data.clone();
        let (order, payment) = self.db.record_deposit_attempt(order_id, total, deposit, remaining, payment).await?;
        info!(
            "🔄️💰️ Deposit of {deposit} requested for order #{order_id} (total {total}). Gateway order {}.",
            session.gateway_order_id
        );
        Ok(NewDepositResult {
            order,
            payment,
            checkout_url: session.checkout_url,
            payment_token: session.payment_token,
            expires_at: session.expires_at,
        })
    }

    /// Applies a gateway payment callback to the ledger and, on success, to the order.
    ///
    /// The callback is matched against its `Pending` deposit attempt by the gateway's order id.
    /// * No match: the callback is acknowledged and dropped. Either the id is unknown to us or an
    ///   earlier delivery already settled the attempt; both are logged, neither is an error.
    /// * Match, `success = true`: the ledger entry settles to `Success` and the order moves
    ///   `Pending → Paid`.
    /// * Match, `success = false`: the ledger entry moves to `Failed`; the order stays `Pending`.
    ///
    /// Calling this twice with the same payload changes state exactly once. An amount differing
    /// from the recorded attempt is logged at warn level but does not block settlement; the raw
    /// payload is stored for audit either way.
    pub async fn reconcile_callback(&self, callback: &PaymentCallback) -> Result<ReconcileOutcome, BookingError> {
        let pending = self
            .db
            .fetch_pending_deposit_for_gateway_order(callback.gateway, &callback.gateway_order_id)
            .await?;
        let Some(pending) = pending else {
            info!(
                "🔄️ Callback for gateway order {} matches no pending deposit. Acknowledging and ignoring it.",
                callback.gateway_order_id
            );
            return Ok(ReconcileOutcome::Unmatched);
        };
        if callback.amount != pending.amount {
            warn!(
                "🔄️ Callback amount {} differs from the recorded attempt {} on payment {}. Proceeding; the raw \
                 payload is kept for audit.",
                callback.amount, pending.amount, pending.id
            );
        }
        let raw = (!callback.raw_payload.is_empty()).then(|| callback.raw_payload.clone());
        if callback.success {
            if callback.gateway_txn_id.is_none() {
                warn!("🔄️ Successful callback for payment {} carries no transaction id", pending.id);
            }
            match self.db.confirm_deposit(pending.id, callback.gateway_txn_id.clone(), raw).await {
                Ok((payment, Some(order))) => {
                    info!("🔄️✅️ Deposit for order #{} confirmed. Order is now {}.", order.id, order.status);
                    Ok(ReconcileOutcome::Confirmed { payment, order: Some(order) })
                },
                Ok((payment, None)) => {
                    error!(
                        "🔄️ Payment {} settled but order #{} no longer qualifies for Paid. The ledger entry stands; \
                         this order needs operator attention.",
                        payment.id, payment.order_id
                    );
                    Ok(ReconcileOutcome::Confirmed { payment, order: None })
                },
                Err(BookingError::InvalidLedgerTransition { payment_id, status, .. }) => {
                    info!("🔄️ Callback replay for payment {payment_id} (already {status}). Nothing to do.");
                    Ok(ReconcileOutcome::Unmatched)
                },
                Err(e) => Err(e),
            }
        } else {
            match self.db.mark_payment_failed(pending.id, "The gateway reported a failed payment", raw).await {
                Ok(payment) => {
                    info!(
                        "🔄️ Deposit attempt {} for order #{} failed at the gateway. The buyer may retry.",
                        payment.id, payment.order_id
                    );
                    Ok(ReconcileOutcome::MarkedFailed(payment))
                },
                Err(BookingError::InvalidLedgerTransition { payment_id, status, .. }) => {
                    info!("🔄️ Callback replay for payment {payment_id} (already {status}). Nothing to do.");
                    Ok(ReconcileOutcome::Unmatched)
                },
                Err(e) => Err(e),
            }
        }
    }

    /// The provider commits to a `Paid` order.
    pub async fn accept_order(&self, actor: &Actor, order_id: i64) -> Result<Order, BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !order.is_provider(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        match self.db.accept_order(order_id).await? {
            Some(order) => {
                info!("🔄️ Order #{order_id} accepted by {actor}");
                Ok(order)
            },
            None => Err(self.transition_failed(order_id, OrderStatusType::Accepted).await),
        }
    }

    /// The provider starts work on an `Accepted` order.
    pub async fn start_progress(&self, actor: &Actor, order_id: i64) -> Result<Order, BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !order.is_provider(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        match self.db.start_order_progress(order_id).await? {
            Some(order) => {
                info!("🔄️ Order #{order_id} is now in progress");
                Ok(order)
            },
            None => Err(self.transition_failed(order_id, OrderStatusType::InProgress).await),
        }
    }

    /// The provider or the buyer marks an `Accepted` or `InProgress` order as fulfilled.
    pub async fn complete_order(&self, actor: &Actor, order_id: i64) -> Result<Order, BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !order.is_provider(actor) && !order.is_buyer(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        match self.db.complete_order(order_id, actor).await? {
            Some(order) => {
                info!("🔄️🎉️ Order #{order_id} completed by {actor}");
                Ok(order)
            },
            None => Err(self.transition_failed(order_id, OrderStatusType::Completed).await),
        }
    }

    /// The provider (or an admin) declines an order. Legal from any non-terminal status.
    ///
    /// If the order has a settled deposit it is refunded automatically; the refund ledger entry is
    /// returned alongside the order. Rejecting an order that was never paid simply rejects it.
    pub async fn reject_order(&self, actor: &Actor, order_id: i64) -> Result<(Order, Option<Payment>), BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !actor.is_admin() && !order.is_provider(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        let order = match self.db.reject_order(order_id, actor).await? {
            Some(order) => order,
            None => return Err(self.transition_failed(order_id, OrderStatusType::Rejected).await),
        };
        info!("🔄️⛔️ Order #{order_id} rejected by {actor}");
        let refund = self.refund_deposit_if_any(&order).await?;
        Ok((order, refund))
    }

    /// The buyer withdraws a `Pending` or `Paid` order.
    ///
    /// A settled deposit is refunded only when the cancellation lands more than
    /// [`CANCELLATION_REFUND_WINDOW_HOURS`] before the event date; closer than that, the deposit is
    /// forfeit.
    pub async fn cancel_order(&self, actor: &Actor, order_id: i64) -> Result<(Order, Option<Payment>), BookingError> {
        let order = self.fetch_for_update(order_id).await?;
        if !order.is_buyer(actor) {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        let order = match self.db.cancel_order(order_id).await? {
            Some(order) => order,
            None => return Err(self.transition_failed(order_id, OrderStatusType::Cancelled).await),
        };
        info!("🔄️ Order #{order_id} cancelled by its buyer");
        let event_start = order.event_date.and_time(NaiveTime::MIN).and_utc();
        let refund = if event_start - Utc::now() > Duration::hours(CANCELLATION_REFUND_WINDOW_HOURS) {
            self.refund_deposit_if_any(&order).await?
        } else {
            info!(
                "🔄️ Order #{order_id} was cancelled within {CANCELLATION_REFUND_WINDOW_HOURS}h of the event. The \
                 deposit is not refunded."
            );
            None
        };
        Ok((order, refund))
    }

    /// Admin-only soft delete. Refused while the order is financially live (`Paid`, `Accepted` or
    /// `InProgress`); those orders must be rejected or completed first.
    pub async fn delete_order(&self, actor: &Actor, order_id: i64) -> Result<Order, BookingError> {
        if !actor.is_admin() {
            return Err(BookingError::Forbidden { actor: *actor });
        }
        let order = self.fetch_for_update(order_id).await?;
        match self.db.soft_delete_order(order_id).await? {
            Some(deleted) => {
                info!("🔄️ Order #{order_id} soft-deleted by {actor}");
                Ok(deleted)
            },
            None => Err(BookingError::DeleteBlocked { order_id, status: order.status }),
        }
    }

    /// Refunds the order's settled deposit, if there is one.
    ///
    /// The refund row is written whether or not the gateway call goes through: a gateway failure
    /// (or a deposit that never got a transaction id) is recorded on the row via `error_message`
    /// and logged for manual follow-up. If there is no settled deposit, or a refund row already
    /// exists, nothing is written.
    async fn refund_deposit_if_any(&self, order: &Order) -> Result<Option<Payment>, BookingError> {
        let Some(deposit) = self.db.fetch_successful_deposit(order.id).await? else {
            debug!("🔄️ Order #{} has no settled deposit. Nothing to refund.", order.id);
            return Ok(None);
        };
        if self.db.refund_exists_for_order(order.id).await? {
            warn!("🔄️ A refund has already been recorded for order #{}. Skipping.", order.id);
            return Ok(None);
        }
        let mut refund = NewPayment::refund(order.id, deposit.amount);
        refund.gateway = deposit.gateway;
        match &deposit.gateway_txn_id {
            Some(txn_id) => {
                refund = refund.with_gateway_txn_id(txn_id.clone());
                match self.gateway.request_refund(txn_id, deposit.amount).await {
                    Ok(ack) => {
                        refund.response_data = ack.response_data;
                    },
                    Err(e) => {
                        warn!(
                            "🔄️ Gateway refund of {} for order #{} failed: {e}. Recording the refund locally for \
                             manual follow-up.",
                            deposit.amount, order.id
                        );
                        refund = refund.with_error_message(e.to_string());
                    },
                }
            },
            None => {
                warn!(
                    "🔄️ Deposit {} for order #{} has no gateway transaction id. Recording the refund for manual \
                     processing.",
                    deposit.id, order.id
                );
                refund = refund.with_error_message("No gateway transaction id on the deposit".to_string());
            },
        }
        match self.db.record_refund(refund).await {
            Ok(payment) => {
                info!("🔄️💸️ Refund of {} recorded for order #{}", payment.amount, order.id);
                Ok(Some(payment))
            },
            Err(BookingError::RefundUnavailable(reason)) => {
                warn!("🔄️ Refund for order #{} lost a race: {reason}. Skipping.", order.id);
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// Fetches an order for a mutating call, or `OrderNotFound`.
    async fn fetch_for_update(&self, order_id: i64) -> Result<Order, BookingError> {
        self.db.fetch_order_by_id(order_id).await?.ok_or(BookingError::OrderNotFound(order_id))
    }

    /// Builds the error for a compare-and-set that matched no row: the order either disappeared or,
    /// far more likely, raced into a status the transition is not legal from.
    async fn transition_failed(&self, order_id: i64, target: OrderStatusType) -> BookingError {
        match self.db.fetch_order_by_id(order_id).await {
            Ok(Some(order)) => BookingError::InvalidTransition { order_id, status: order.status, target },
            Ok(None) => BookingError::OrderNotFound(order_id),
            Err(e) => e,
        }
    }
}
