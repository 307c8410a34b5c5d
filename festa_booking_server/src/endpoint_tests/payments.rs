use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{NaiveDate, TimeZone, Utc};
use festa_booking_engine::{
    db_types::{Actor, GatewayKind, Order, OrderStatusType, Payment, PaymentStatus, PaymentType},
    traits::{DepositSession, GatewayError},
    OrderFlowApi,
    PaymentsApi,
};
use festa_common::Money;

use super::{
    helpers::{get_request, post_request},
    mocks::{MockBookingBackend, MockPaymentProcessor},
};
use crate::routes::{MyPaymentsRoute, OrderPaymentsRoute, PaymentByIdRoute, RequestDepositRoute};

#[actix_web::test]
async fn fetch_payments_for_order() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) =
        get_request(Some(buyer), "/orders/1/payments", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_PAYMENTS_JSON);
}

#[actix_web::test]
async fn fetch_payments_for_order_as_a_stranger() {
    let _ = env_logger::try_init().ok();
    let other_buyer = Actor::buyer(12);
    let err = get_request(Some(other_buyer), "/orders/1/payments", configure_reads).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #12 is not permitted to perform this action");
}

#[actix_web::test]
async fn fetch_my_payments() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) = get_request(Some(buyer), "/my/payments", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, MY_PAYMENTS_JSON);
}

#[actix_web::test]
async fn fetch_payment_by_id_as_admin() {
    let _ = env_logger::try_init().ok();
    let admin = Actor::admin(7);
    let (status, body) = get_request(Some(admin), "/payments/4", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PAYMENT_JSON);
}

#[actix_web::test]
async fn fetch_missing_payment_by_id() {
    let _ = env_logger::try_init().ok();
    let admin = Actor::admin(7);
    let err = get_request(Some(admin), "/payments/99", configure_missing_payment).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. The requested payment 99 does not exist");
}

#[actix_web::test]
async fn fetch_payment_by_id_as_a_buyer() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let err = get_request(Some(buyer), "/payments/4", configure_reads).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #11 may not access this endpoint");
}

#[actix_web::test]
async fn request_deposit() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) =
        post_request(Some(buyer), "/orders/1/deposit", "", configure_deposit).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, DEPOSIT_JSON);
}

#[actix_web::test]
async fn request_deposit_for_another_buyers_order() {
    let _ = env_logger::try_init().ok();
    let other_buyer = Actor::buyer(12);
    let err =
        post_request(Some(other_buyer), "/orders/1/deposit", "", configure_deposit).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #12 is not permitted to perform this action");
}

#[actix_web::test]
async fn request_deposit_when_the_gateway_is_down() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let err = post_request(Some(buyer), "/orders/1/deposit", "", configure_gateway_down)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "The payment gateway is unavailable. The payment gateway could not be reached: timed out");
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(paid_order())));
    db.expect_fetch_payments_for_order().returning(|_| Ok(vec![successful_deposit()]));
    db.expect_fetch_payments_for_buyer().returning(|_| Ok(vec![successful_deposit(), refund_payment()]));
    db.expect_fetch_payment_by_id().returning(|_| Ok(Some(successful_deposit())));
    let payments_api = PaymentsApi::new(db);
    cfg.service(OrderPaymentsRoute::<MockBookingBackend>::new())
        .service(MyPaymentsRoute::<MockBookingBackend>::new())
        .service(PaymentByIdRoute::<MockBookingBackend>::new())
        .app_data(web::Data::new(payments_api));
}

fn configure_missing_payment(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_payment_by_id().returning(|_| Ok(None));
    let payments_api = PaymentsApi::new(db);
    cfg.service(PaymentByIdRoute::<MockBookingBackend>::new()).app_data(web::Data::new(payments_api));
}

fn configure_deposit(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    db.expect_fetch_package().returning(|_| Ok(Some(package())));
    // The split must be 10% of the current catalog price, correlated to the gateway session.
    db.expect_record_deposit_attempt()
        .withf(|order_id, total, deposit, remaining, payment| {
            *order_id == 1 &&
                *total == Money::from_whole(300) &&
                *deposit == Money::from_cents(3000) &&
                *remaining == Money::from_cents(27000) &&
                payment.gateway_order_id.as_deref() == Some("4422001")
        })
        .returning(|_, _, _, _, _| Ok((deposit_order(), pending_deposit())));
    let mut gateway = MockPaymentProcessor::new();
    gateway.expect_kind().return_const(GatewayKind::Paymob);
    gateway.expect_create_deposit_session().returning(|_, _| Ok(deposit_session()));
    let api = OrderFlowApi::new(db, gateway);
    cfg.service(RequestDepositRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

// No ledger expectations: nothing may be written when the gateway call fails.
fn configure_gateway_down(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    db.expect_fetch_package().returning(|_| Ok(Some(package())));
    let mut gateway = MockPaymentProcessor::new();
    gateway
        .expect_create_deposit_session()
        .returning(|_, _| Err(GatewayError::Unavailable("timed out".to_string())));
    let api = OrderFlowApi::new(db, gateway);
    cfg.service(RequestDepositRoute::<MockBookingBackend, MockPaymentProcessor>::new())
        .app_data(web::Data::new(api));
}

fn pending_order() -> Order {
    Order {
        id: 1,
        buyer_id: 11,
        provider_id: 22,
        package_id: 33,
        status: OrderStatusType::Pending,
        total_amount: Money::from_whole(300),
        deposit_amount: Money::default(),
        remaining_amount: Money::from_whole(300),
        event_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        latitude: None,
        longitude: None,
        address: None,
        notes: None,
        paid_at: None,
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
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
    }
}

fn paid_order() -> Order {
    Order {
        status: OrderStatusType::Paid,
        deposit_amount: Money::from_cents(3000),
        remaining_amount: Money::from_cents(27000),
        paid_at: Some(Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        ..pending_order()
    }
}

// The order after `record_deposit_attempt`: the amounts are split but the status has not moved.
fn deposit_order() -> Order {
    Order {
        deposit_amount: Money::from_cents(3000),
        remaining_amount: Money::from_cents(27000),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 30, 0).unwrap(),
        ..pending_order()
    }
}

fn package() -> festa_booking_engine::db_types::Package {
    festa_booking_engine::db_types::Package {
        id: 33,
        name: "Garden wedding, silver".to_string(),
        price: Money::from_whole(300),
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap(),
    }
}

fn deposit_session() -> DepositSession {
    DepositSession {
        gateway_order_id: "4422001".to_string(),
        payment_token: "pk_test_1".to_string(),
        checkout_url: "https://accept.paymob.com/api/acceptance/iframes/771?payment_token=pk_test_1".to_string(),
        expires_at: Utc.with_ymd_and_hms(2026, 8, 1, 11, 0, 0).unwrap(),
        request_data: None,
        response_data: None,
    }
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

fn successful_deposit() -> Payment {
    Payment {
        status: PaymentStatus::Success,
        gateway_txn_id: Some("987654".to_string()),
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 5, 0).unwrap(),
        ..pending_deposit()
    }
}

fn refund_payment() -> Payment {
    Payment {
        id: 5,
        payment_type: PaymentType::Refund,
        status: PaymentStatus::Refunded,
        gateway_order_id: None,
        response_data: Some(r#"{"id":771}"#.to_string()),
        refunded_at: Some(Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap()),
        created_at: Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
        ..successful_deposit()
    }
}

const PAYMENT_JSON: &str = r#"{"id":4,"order_id":1,"payment_type":"Deposit","status":"Success","gateway":"Paymob","amount":"30.00","gateway_txn_id":"987654","gateway_order_id":"4422001","request_data":null,"response_data":null,"error_message":null,"refunded_at":null,"created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:05:00Z"}"#;

const ORDER_PAYMENTS_JSON: &str = r#"[{"id":4,"order_id":1,"payment_type":"Deposit","status":"Success","gateway":"Paymob","amount":"30.00","gateway_txn_id":"987654","gateway_order_id":"4422001","request_data":null,"response_data":null,"error_message":null,"refunded_at":null,"created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:05:00Z"}]"#;

const MY_PAYMENTS_JSON: &str = r#"{"buyer_id":11,"total_paid":"30.00","total_refunded":"30.00","payments":[{"id":4,"order_id":1,"payment_type":"Deposit","status":"Success","gateway":"Paymob","amount":"30.00","gateway_txn_id":"987654","gateway_order_id":"4422001","request_data":null,"response_data":null,"error_message":null,"refunded_at":null,"created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:05:00Z"},{"id":5,"order_id":1,"payment_type":"Refund","status":"Refunded","gateway":"Paymob","amount":"30.00","gateway_txn_id":"987654","gateway_order_id":null,"request_data":null,"response_data":"{\"id\":771}","error_message":null,"refunded_at":"2026-08-02T09:00:00Z","created_at":"2026-08-02T09:00:00Z","updated_at":"2026-08-02T09:00:00Z"}]}"#;

const DEPOSIT_JSON: &str = r#"{"order":{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Pending","total_amount":"300.00","deposit_amount":"30.00","remaining_amount":"270.00","event_date":"2026-09-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":null,"accepted_at":null,"rejected_at":null,"completed_at":null,"cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-01T09:30:00Z"},"payment":{"id":4,"order_id":1,"payment_type":"Deposit","status":"Pending","gateway":"Paymob","amount":"30.00","gateway_txn_id":null,"gateway_order_id":"4422001","request_data":null,"response_data":null,"error_message":null,"refunded_at":null,"created_at":"2026-08-01T09:30:00Z","updated_at":"2026-08-01T09:30:00Z"},"checkout_url":"https://accept.paymob.com/api/acceptance/iframes/771?payment_token=pk_test_1","payment_token":"pk_test_1","expires_at":"2026-08-01T11:00:00Z"}"#;
