//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current
//! thread stalls every request queued on that worker. Long, non-cpu-bound operations (database
//! calls, gateway requests) must be expressed as futures or asynchronous functions, which worker
//! threads execute concurrently.
use actix_web::{get, web, HttpResponse, Responder};
use festa_booking_engine::{
    db_types::Role,
    order_objects::OrderQueryFilter,
    traits::{BookingDatabase, OrderManagement, PaymentGateway},
    OrderFlowApi,
    OrdersApi,
    PaymentsApi,
};
use log::*;

use crate::{
    auth::ActorClaims,
    data_objects::{ClosedOrderResult, NewOrderParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/orders" impl BookingDatabase, PaymentGateway where requires [Role::Buyer]);
/// Route handler for creating a new order.
///
/// Buyers book a package for an event date. The order is created `Pending` with a zero deposit and
/// its total read from the package catalog, never from the client. Admins may create an order on a
/// buyer's behalf by supplying `buyer_id` in the body; buyers naming anyone but themselves get a
/// 403.
pub async fn create_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let actor = claims.actor;
    debug!("💻️ New order request from {actor} for package {}", params.package_id);
    let new_order = params.into_new_order(actor.id);
    let order = api.create_order(&actor, new_order).await.map_err(|e| {
        debug!("💻️ Could not create the order. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(orders_search => Get "/orders" impl OrderManagement where requires [Role::Admin]);
/// Admin search across all orders. An empty query returns everything that is not soft-deleted.
pub async fn orders_search<B: OrderManagement>(
    claims: ActorClaims,
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor;
    debug!("💻️ GET orders search for [{query}]");
    let query = query.into_inner();
    let orders = api.search_orders(&actor, query).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement where requires [Role::Buyer, Role::Provider]);
/// Use `/orders/{order_id}` to fetch a specific order by its id.
///
/// Buyers and providers can only see orders they are a party to; anything else is a 403, whether
/// the order exists or not. Admins can fetch any order.
pub async fn order_by_id<B: OrderManagement>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    debug!("💻️ GET order_by_id({order_id}) for {actor}");
    let order = api.fetch_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_orders => Get "/my/orders" impl OrderManagement where requires [Role::Buyer]);
/// Route handler for the my/orders endpoint
///
/// Authenticated buyers fetch their own orders, newest first. Admins list anyone's orders via
/// `GET /orders`.
pub async fn my_orders<B: OrderManagement>(
    claims: ActorClaims,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor;
    debug!("💻️ GET my_orders for {actor}");
    let orders = api.my_orders(&actor).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(provider_orders => Get "/provider/orders" impl OrderManagement where requires [Role::Provider]);
/// Route handler for the provider/orders endpoint
///
/// The acting provider's order book. Only orders with a confirmed deposit or later show up here;
/// unpaid `Pending` orders are not the provider's business yet.
pub async fn provider_orders<B: OrderManagement>(
    claims: ActorClaims,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor;
    debug!("💻️ GET provider_orders for {actor}");
    let orders = api.provider_orders(&actor).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Order lifecycle  ----------------------------------------------------

route!(request_deposit => Post "/orders/{order_id}/deposit" impl BookingDatabase, PaymentGateway where requires [Role::Buyer]);
/// Starts the deposit payment flow for a `Pending` order.
///
/// The deposit is 10% of the current package price. The response carries the refreshed order, the
/// `Pending` ledger entry, and the gateway checkout URL and payment token the buyer completes the
/// payment with. The order only moves to `Paid` once the gateway webhook confirms the payment, so
/// a buyer whose payment failed can simply request a new session.
pub async fn request_deposit<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    info!("💻️💰️ Deposit requested for order #{order_id} by {actor}");
    let result = api.request_deposit(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not create a deposit session for order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(result))
}

route!(accept_order => Post "/orders/{order_id}/accept" impl BookingDatabase, PaymentGateway where requires [Role::Provider]);
/// The order's provider commits to a `Paid` order.
pub async fn accept_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    debug!("💻️ Accept request for order #{order_id} from {actor}");
    let order = api.accept_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not accept order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(start_order => Post "/orders/{order_id}/start" impl BookingDatabase, PaymentGateway where requires [Role::Provider]);
/// The order's provider starts work on an `Accepted` order.
pub async fn start_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    debug!("💻️ Start request for order #{order_id} from {actor}");
    let order = api.start_progress(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not start order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(complete_order => Post "/orders/{order_id}/complete" impl BookingDatabase, PaymentGateway where requires [Role::Buyer, Role::Provider]);
/// Either party marks an `Accepted` or `InProgress` order as fulfilled. The order records who
/// completed it.
pub async fn complete_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    info!("💻️ Completion request for order #{order_id} from {actor}");
    let order = api.complete_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not complete order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reject_order => Post "/orders/{order_id}/reject" impl BookingDatabase, PaymentGateway where requires [Role::Provider]);
/// Order rejection
///
/// The order's provider (or an admin) declines an order. Legal from any non-terminal status. If the
/// order has a settled deposit it is refunded in full, and the refund ledger entry rides along in
/// the response.
pub async fn reject_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    info!("💻️ Reject request for order #{order_id} from {actor}");
    let (order, refund) = api.reject_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not reject order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(ClosedOrderResult { order, refund }))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl BookingDatabase, PaymentGateway where requires [Role::Buyer]);
/// Order cancellation
///
/// The order's buyer withdraws a `Pending` or `Paid` order. A settled deposit is refunded only when
/// the cancellation lands more than 24 hours before the event date; closer than that, the deposit
/// is forfeit. The response carries the cancelled order and the refund entry, if one was written.
pub async fn cancel_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    info!("💻️ Cancel request for order #{order_id} from {actor}");
    let (order, refund) = api.cancel_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not cancel order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(ClosedOrderResult { order, refund }))
}

route!(delete_order => Delete "/orders/{order_id}" impl BookingDatabase, PaymentGateway where requires [Role::Admin]);
/// Admin-only soft delete. Refused while the order is financially live (`Paid`, `Accepted` or
/// `InProgress`); those orders must be rejected or completed first.
pub async fn delete_order<B: BookingDatabase, G: PaymentGateway>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    info!("💻️ Delete request for order #{order_id} from {actor}");
    let order = api.delete_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not delete order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(order_payments => Get "/orders/{order_id}/payments" impl BookingDatabase where requires [Role::Buyer, Role::Provider]);
/// Route handler for the orders/{order_id}/payments endpoint
///
/// The full ledger for one order, oldest entry first: deposit attempts, settlements and refunds.
/// Visibility follows the order, so only its buyer, its provider, or an admin may look.
pub async fn order_payments<B: BookingDatabase>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let actor = claims.actor;
    debug!("💻️ GET order_payments({order_id}) for {actor}");
    let payments = api.payments_for_order(&actor, order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch payments for order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(my_payments => Get "/my/payments" impl BookingDatabase where requires [Role::Buyer]);
/// Route handler for the my/payments endpoint
///
/// The acting buyer's whole payment history, with running totals for settled deposits and refunds.
pub async fn my_payments<B: BookingDatabase>(
    claims: ActorClaims,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let actor = claims.actor;
    debug!("💻️ GET my_payments for {actor}");
    let history = api.my_payments(&actor).await.map_err(|e| {
        debug!("💻️ Could not fetch payments. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(history))
}

route!(payment_by_id => Get "/payments/{payment_id}" impl BookingDatabase where requires [Role::Admin]);
/// Admin-only fetch of a single ledger entry, mostly for support tooling.
pub async fn payment_by_id<B: BookingDatabase>(
    claims: ActorClaims,
    path: web::Path<i64>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let actor = claims.actor;
    debug!("💻️ GET payment_by_id({payment_id}) for {actor}");
    let payment = api.fetch_payment(&actor, payment_id).await.map_err(|e| {
        debug!("💻️ Could not fetch payment {payment_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(payment))
}
