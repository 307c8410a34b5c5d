//----------------------------------------------   Paymob webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use festa_booking_engine::{
    payment_objects::ReconcileOutcome,
    traits::{BookingDatabase, BookingError, PaymentGateway},
    OrderFlowApi,
};
use log::*;
use paymob_tools::CallbackPayload;

use crate::{data_objects::JsonResponse, integrations::paymob::callback_from_payload, route};

route!(paymob_webhook => Post "/paymob" impl BookingDatabase, PaymentGateway);
/// Transaction-processed callback from Paymob.
///
/// The raw body is kept alongside the parsed payload because the ledger stores it for audit.
/// Webhook responses must always be in the 200 range, otherwise Paymob will retry; every branch,
/// including a body we cannot parse, acknowledges the delivery and the JSON envelope says whether
/// anything was actually done.
pub async fn paymob_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: BookingDatabase,
    G: PaymentGateway,
{
    trace!("📨️ Received webhook request: {}", req.uri());
    // TODO: verify the callback HMAC once the Paymob account has a pinned signing scheme.
    let raw = String::from_utf8_lossy(&body).into_owned();
    let payload = match serde_json::from_slice::<CallbackPayload>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("📨️ Could not parse the callback body. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not parse the callback body."));
        },
    };
    let callback = callback_from_payload(payload, &raw);
    let result = match api.reconcile_callback(&callback).await {
        Ok(ReconcileOutcome::Confirmed { payment, order: Some(order) }) => {
            info!("📨️ Payment {} confirmed. Order #{} is now {}.", payment.id, order.id, order.status);
            JsonResponse::success(format!("Payment {} confirmed.", payment.id))
        },
        Ok(ReconcileOutcome::Confirmed { payment, order: None }) => {
            info!("📨️ Payment {} confirmed. The order was left as-is.", payment.id);
            JsonResponse::success(format!("Payment {} confirmed.", payment.id))
        },
        Ok(ReconcileOutcome::MarkedFailed(payment)) => {
            info!("📨️ Payment {} marked as failed. The buyer may retry.", payment.id);
            JsonResponse::success(format!("Payment {} marked as failed.", payment.id))
        },
        Ok(ReconcileOutcome::Unmatched) => {
            info!("📨️ Callback for gateway order {} matched no pending deposit.", callback.gateway_order_id);
            JsonResponse::success("No matching pending deposit.")
        },
        Err(BookingError::DatabaseError(e)) => {
            warn!("📨️ Could not process the callback for gateway order {}. {e}", callback.gateway_order_id);
            JsonResponse::failure("Internal error while processing the callback.")
        },
        Err(e) => {
            warn!("📨️ Unexpected error while handling the callback. {e}");
            JsonResponse::failure("Unexpected error handling the callback.")
        },
    };
    HttpResponse::Ok().json(result)
}
