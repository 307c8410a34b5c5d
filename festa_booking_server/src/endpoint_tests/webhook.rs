use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{NaiveDate, TimeZone, Utc};
use festa_booking_engine::{
    db_types::{GatewayKind, Order, OrderStatusType, Payment, PaymentStatus, PaymentType},
    traits::BookingError,
    OrderFlowApi,
};
use festa_common::Money;

use super::{
    helpers::post_request,
    mocks::{MockBookingBackend, MockPaymentProcessor},
};
use crate::paymob_routes::PaymobWebhookRoute;

// Whatever happens, the webhook must answer 200 or Paymob keeps retrying the delivery.

#[actix_web::test]
async fn malformed_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(None, "/paymob", "junk, not a callback", configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Could not parse the callback body."}"#);
}

#[actix_web::test]
async fn unmatched_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(None, "/paymob", SUCCESS_CALLBACK, configure_unmatched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"No matching pending deposit."}"#);
}

#[actix_web::test]
async fn successful_callback_confirms_the_deposit() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(None, "/paymob", SUCCESS_CALLBACK, configure_confirm).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment 4 confirmed."}"#);
}

#[actix_web::test]
async fn failed_callback_marks_the_attempt_failed() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(None, "/paymob", FAILED_CALLBACK, configure_failure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment 4 marked as failed."}"#);
}

#[actix_web::test]
async fn database_errors_are_not_leaked_to_the_gateway() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(None, "/paymob", SUCCESS_CALLBACK, configure_db_down).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Internal error while processing the callback."}"#);
}

// A body that never parses must not reach the engine at all.
fn configure_untouched(cfg: &mut ServiceConfig) {
    let api = OrderFlowApi::new(MockBookingBackend::new(), MockPaymentProcessor::new());
    cfg.service(PaymobWebhookRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn configure_unmatched(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_pending_deposit_for_gateway_order().returning(|_, _| Ok(None));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(PaymobWebhookRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn configure_confirm(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_pending_deposit_for_gateway_order()
        .withf(|gateway, gateway_order_id| *gateway == GatewayKind::Paymob && gateway_order_id == "4422001")
        .returning(|_, _| Ok(Some(pending_deposit())));
    // The raw callback body must land on the ledger entry for audit.
    db.expect_confirm_deposit()
        .withf(|payment_id, txn_id, raw| {
            *payment_id == 4 && txn_id.as_deref() == Some("987654") && raw.as_deref() == Some(SUCCESS_CALLBACK)
        })
        .returning(|_, _, _| Ok((settled_deposit(), Some(paid_order()))));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(PaymobWebhookRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn configure_failure(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_pending_deposit_for_gateway_order().returning(|_, _| Ok(Some(pending_deposit())));
    db.expect_mark_payment_failed()
        .withf(|payment_id, reason, _raw| *payment_id == 4 && reason == "The gateway reported a failed payment")
        .returning(|_, _, _| Ok(failed_deposit()));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(PaymobWebhookRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn configure_db_down(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_pending_deposit_for_gateway_order()
        .returning(|_, _| Err(BookingError::DatabaseError("connection refused".to_string())));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(PaymobWebhookRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn pending_deposit() -> Payment {
    Payment {
        id: 4,
        order_id: 1,
        payment_type: PaymentType::Deposit,
        status: PaymentStatus::Pending,
        gateway: GatewayKind::Paymob,
        amount: Money::from_cents(3000),
        gateway_txn_id: None,
        gateway_order_id: Some("4422001".to_string()),
        request_data: None,
        response_data: None,
        error_message: None,
        refunded_at: None,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 30, 0).unwrap(),
    }
}

fn settled_deposit() -> Payment {
    Payment {
        status: PaymentStatus::Success,
        gateway_txn_id: Some("987654".to_string()),
        response_data: Some(SUCCESS_CALLBACK.to_string()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        ..pending_deposit()
    }
}

fn failed_deposit() -> Payment {
    Payment {
        status: PaymentStatus::Failed,
        error_message: Some("The gateway reported a failed payment".to_string()),
        response_data: Some(FAILED_CALLBACK.to_string()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        ..pending_deposit()
    }
}

fn paid_order() -> Order {
    Order {
        id: 1,
        buyer_id: 11,
        provider_id: 22,
        package_id: 33,
        status: OrderStatusType::Paid,
        total_amount: Money::from_whole(300),
        deposit_amount: Money::from_cents(3000),
        remaining_amount: Money::from_cents(27000),
        event_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        latitude: None,
        longitude: None,
        address: None,
        notes: None,
        paid_at: Some(Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap()),
        accepted_at: None,
        rejected_at: None,
        completed_at: None,
        cancelled_at: None,
        rejected_by: None,
        rejected_by_id: None,
        completed_by: None,
        completed_by_id: None,
        deleted_at: None,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
    }
}

const SUCCESS_CALLBACK: &str =
    r#"{"order_id":4422001,"success":true,"amount_cents":3000,"transaction_id":987654,"currency":"EGP"}"#;

const FAILED_CALLBACK: &str =
    r#"{"order_id":4422001,"success":false,"amount_cents":3000,"transaction_id":987655,"currency":"EGP"}"#;
