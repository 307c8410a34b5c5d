use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{NaiveDate, TimeZone, Utc};
use festa_booking_engine::{
    db_types::{Actor, GatewayKind, Order, OrderStatusType, Payment, PaymentStatus, PaymentType, Role},
    traits::RefundAck,
    OrderFlowApi,
    OrdersApi,
};
use festa_common::Money;

use super::{
    helpers::{delete_request, get_request, post_request},
    mocks::{MockBookingBackend, MockPaymentProcessor},
};
use crate::routes::{
    AcceptOrderRoute,
    CancelOrderRoute,
    CreateOrderRoute,
    DeleteOrderRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    RejectOrderRoute,
};

#[actix_web::test]
async fn fetch_my_orders_no_headers() {
    let _ = env_logger::try_init().ok();
    let err = get_request(None, "/my/orders", configure_reads).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No identity headers were supplied with the request.");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) = get_request(Some(buyer), "/my/orders", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, MY_ORDERS_JSON);
}

#[actix_web::test]
async fn providers_may_not_use_the_buyer_order_list() {
    let _ = env_logger::try_init().ok();
    let provider = Actor::provider(22);
    let err = get_request(Some(provider), "/my/orders", configure_reads).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. provider #22 may not access this endpoint");
}

#[actix_web::test]
async fn admins_pass_the_role_check_on_buyer_routes() {
    let _ = env_logger::try_init().ok();
    let admin = Actor::admin(7);
    let (status, body) = get_request(Some(admin), "/my/orders", configure_empty_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn fetch_order_by_id_as_its_buyer() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) = get_request(Some(buyer), "/orders/1", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PENDING_JSON);
}

#[actix_web::test]
async fn fetch_order_by_id_as_a_stranger() {
    let _ = env_logger::try_init().ok();
    let other_buyer = Actor::buyer(12);
    let err = get_request(Some(other_buyer), "/orders/1", configure_reads).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #12 is not permitted to perform this action");
}

#[actix_web::test]
async fn fetch_missing_order_by_id() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let err = get_request(Some(buyer), "/orders/42", configure_missing_order).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. The requested order 42 does not exist");
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let body = r#"{"provider_id":22,"package_id":33,"event_date":"2026-09-01"}"#;
    let (status, body) = post_request(Some(buyer), "/orders", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PENDING_JSON);
}

#[actix_web::test]
async fn create_order_on_behalf_of_another_buyer() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let body = r#"{"buyer_id":12,"provider_id":22,"package_id":33,"event_date":"2026-09-01"}"#;
    let err = post_request(Some(buyer), "/orders", body, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #11 is not permitted to perform this action");
}

#[actix_web::test]
async fn accept_order() {
    let _ = env_logger::try_init().ok();
    let provider = Actor::provider(22);
    let (status, body) =
        post_request(Some(provider), "/orders/1/accept", "", configure_accept).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACCEPTED_JSON);
}

#[actix_web::test]
async fn accept_order_as_the_wrong_provider() {
    let _ = env_logger::try_init().ok();
    let other_provider = Actor::provider(23);
    let err = post_request(Some(other_provider), "/orders/1/accept", "", configure_accept)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. provider #23 is not permitted to perform this action");
}

#[actix_web::test]
async fn accept_order_before_the_deposit_is_paid() {
    let _ = env_logger::try_init().ok();
    let provider = Actor::provider(22);
    let err = post_request(Some(provider), "/orders/1/accept", "", configure_accept_unpaid)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "The requested change is not allowed. Order 1 is Pending and cannot transition to Accepted");
}

#[actix_web::test]
async fn reject_order_refunds_the_deposit() {
    let _ = env_logger::try_init().ok();
    let provider = Actor::provider(22);
    let (status, body) =
        post_request(Some(provider), "/orders/1/reject", "", configure_reject).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, REJECTED_JSON);
}

#[actix_web::test]
async fn cancel_order_close_to_the_event_forfeits_the_deposit() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let (status, body) =
        post_request(Some(buyer), "/orders/1/cancel", "", configure_cancel).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, CANCELLED_JSON);
}

#[actix_web::test]
async fn delete_order_as_admin() {
    let _ = env_logger::try_init().ok();
    let admin = Actor::admin(7);
    let (status, body) = delete_request(Some(admin), "/orders/2", configure_delete).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, DELETED_JSON);
}

#[actix_web::test]
async fn delete_order_as_a_buyer() {
    let _ = env_logger::try_init().ok();
    let buyer = Actor::buyer(11);
    let err = delete_request(Some(buyer), "/orders/2", configure_delete).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. buyer #11 may not access this endpoint");
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_orders_for_buyer().returning(|_| Ok(vec![paid_order(), completed_order()]));
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    let orders_api = OrdersApi::new(db);
    cfg.service(MyOrdersRoute::<MockBookingBackend>::new())
        .service(OrderByIdRoute::<MockBookingBackend>::new())
        .app_data(web::Data::new(orders_api));
}

fn configure_empty_reads(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_orders_for_buyer().returning(|_| Ok(vec![]));
    let orders_api = OrdersApi::new(db);
    cfg.service(MyOrdersRoute::<MockBookingBackend>::new()).app_data(web::Data::new(orders_api));
}

fn configure_missing_order(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(None));
    let orders_api = OrdersApi::new(db);
    cfg.service(OrderByIdRoute::<MockBookingBackend>::new()).app_data(web::Data::new(orders_api));
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_package().returning(|_| Ok(Some(package())));
    // The buyer id must come from the identity headers when the body does not name one.
    db.expect_insert_order()
        .withf(|order, total| order.buyer_id == 11 && order.package_id == 33 && *total == Money::from_whole(300))
        .returning(|_, _| Ok(pending_order()));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(CreateOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
}

fn configure_accept(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(paid_order())));
    db.expect_accept_order().returning(|_| Ok(Some(accepted_order())));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(AcceptOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
}

fn configure_accept_unpaid(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    // The status-guarded update matches no row, so the handler reports the actual status.
    db.expect_accept_order().returning(|_| Ok(None));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(AcceptOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
}

fn configure_reject(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(paid_order())));
    db.expect_reject_order().returning(|_, _| Ok(Some(rejected_order())));
    db.expect_fetch_successful_deposit().returning(|_| Ok(Some(successful_deposit())));
    db.expect_refund_exists_for_order().returning(|_| Ok(false));
    db.expect_record_refund()
        .withf(|refund| refund.amount == Money::from_cents(3000) && refund.gateway_txn_id.as_deref() == Some("987654"))
        .returning(|_| Ok(refund_payment()));
    let mut gateway = MockPaymentProcessor::new();
    gateway
        .expect_request_refund()
        .returning(|_, _| Ok(RefundAck { response_data: Some(r#"{"id":771}"#.to_string()) }));
    let api = OrderFlowApi::new(db, gateway);
    cfg.service(RejectOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
}

// No ledger or gateway expectations: a refund attempt this close to the event is a bug.
fn configure_cancel(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id()
        .returning(|_| Ok(Some(Order { event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), ..paid_order() })));
    db.expect_cancel_order().returning(|_| Ok(Some(cancelled_order())));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(CancelOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
}

fn configure_delete(cfg: &mut ServiceConfig) {
    let mut db = MockBookingBackend::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(completed_order())));
    db.expect_soft_delete_order().returning(|_| Ok(Some(deleted_order())));
    let api = OrderFlowApi::new(db, MockPaymentProcessor::new());
    cfg.service(DeleteOrderRoute::<MockBookingBackend, MockPaymentProcessor>::new()).app_data(web::Data::new(api));
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

fn accepted_order() -> Order {
    Order {
        status: OrderStatusType::Accepted,
        accepted_at: Some(Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
        ..paid_order()
    }
}

fn rejected_order() -> Order {
    Order {
        status: OrderStatusType::Rejected,
        rejected_at: Some(Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap()),
        rejected_by: Some(Role::Provider),
        rejected_by_id: Some(22),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
        ..paid_order()
    }
}

fn cancelled_order() -> Order {
    Order {
        status: OrderStatusType::Cancelled,
        event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        cancelled_at: Some(Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap(),
        ..paid_order()
    }
}

fn completed_order() -> Order {
    Order {
        id: 2,
        package_id: 34,
        status: OrderStatusType::Completed,
        total_amount: Money::from_whole(500),
        deposit_amount: Money::from_cents(5000),
        remaining_amount: Money::from_cents(45000),
        event_date: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
        paid_at: Some(Utc.with_ymd_and_hms(2026, 6, 21, 10, 0, 0).unwrap()),
        accepted_at: Some(Utc.with_ymd_and_hms(2026, 6, 22, 9, 0, 0).unwrap()),
        completed_at: Some(Utc.with_ymd_and_hms(2026, 7, 15, 20, 0, 0).unwrap()),
        completed_by: Some(Role::Provider),
        completed_by_id: Some(22),
        created_at: Utc.with_ymd_and_hms(2026, 6, 20, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 7, 15, 20, 0, 0).unwrap(),
        ..pending_order()
    }
}

fn deleted_order() -> Order {
    Order {
        deleted_at: Some(Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap()),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap(),
        ..completed_order()
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

fn successful_deposit() -> Payment {
    Payment {
        id: 4,
        order_id: 1,
        payment_type: PaymentType::Deposit,
        status: PaymentStatus::Success,
        gateway: GatewayKind::Paymob,
        amount: Money::from_cents(3000),
        gateway_txn_id: Some("987654".to_string()),
        gateway_order_id: Some("4422001".to_string()),
        request_data: None,
        response_data: None,
        error_message: None,
        refunded_at: None,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 5, 0).unwrap(),
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

const PENDING_JSON: &str = r#"{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Pending","total_amount":"300.00","deposit_amount":"0.00","remaining_amount":"300.00","event_date":"2026-09-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":null,"accepted_at":null,"rejected_at":null,"completed_at":null,"cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-01T09:00:00Z"}"#;

const MY_ORDERS_JSON: &str = r#"[{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Paid","total_amount":"300.00","deposit_amount":"30.00","remaining_amount":"270.00","event_date":"2026-09-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-08-01T10:00:00Z","accepted_at":null,"rejected_at":null,"completed_at":null,"cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-01T10:00:00Z"},{"id":2,"buyer_id":11,"provider_id":22,"package_id":34,"status":"Completed","total_amount":"500.00","deposit_amount":"50.00","remaining_amount":"450.00","event_date":"2026-07-15","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-06-21T10:00:00Z","accepted_at":"2026-06-22T09:00:00Z","rejected_at":null,"completed_at":"2026-07-15T20:00:00Z","cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":"provider","completed_by_id":22,"deleted_at":null,"created_at":"2026-06-20T09:00:00Z","updated_at":"2026-07-15T20:00:00Z"}]"#;

const ACCEPTED_JSON: &str = r#"{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Accepted","total_amount":"300.00","deposit_amount":"30.00","remaining_amount":"270.00","event_date":"2026-09-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-08-01T10:00:00Z","accepted_at":"2026-08-02T09:00:00Z","rejected_at":null,"completed_at":null,"cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-02T09:00:00Z"}"#;

const REJECTED_JSON: &str = r#"{"order":{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Rejected","total_amount":"300.00","deposit_amount":"30.00","remaining_amount":"270.00","event_date":"2026-09-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-08-01T10:00:00Z","accepted_at":null,"rejected_at":"2026-08-02T09:00:00Z","completed_at":null,"cancelled_at":null,"rejected_by":"provider","rejected_by_id":22,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-02T09:00:00Z"},"refund":{"id":5,"order_id":1,"payment_type":"Refund","status":"Refunded","gateway":"Paymob","amount":"30.00","gateway_txn_id":"987654","gateway_order_id":null,"request_data":null,"response_data":"{\"id\":771}","error_message":null,"refunded_at":"2026-08-02T09:00:00Z","created_at":"2026-08-02T09:00:00Z","updated_at":"2026-08-02T09:00:00Z"}}"#;

const CANCELLED_JSON: &str = r#"{"order":{"id":1,"buyer_id":11,"provider_id":22,"package_id":33,"status":"Cancelled","total_amount":"300.00","deposit_amount":"30.00","remaining_amount":"270.00","event_date":"2025-06-01","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-08-01T10:00:00Z","accepted_at":null,"rejected_at":null,"completed_at":null,"cancelled_at":"2026-08-02T09:00:00Z","rejected_by":null,"rejected_by_id":null,"completed_by":null,"completed_by_id":null,"deleted_at":null,"created_at":"2026-08-01T09:00:00Z","updated_at":"2026-08-02T09:00:00Z"},"refund":null}"#;

const DELETED_JSON: &str = r#"{"id":2,"buyer_id":11,"provider_id":22,"package_id":34,"status":"Completed","total_amount":"500.00","deposit_amount":"50.00","remaining_amount":"450.00","event_date":"2026-07-15","latitude":null,"longitude":null,"address":null,"notes":null,"paid_at":"2026-06-21T10:00:00Z","accepted_at":"2026-06-22T09:00:00Z","rejected_at":null,"completed_at":"2026-07-15T20:00:00Z","cancelled_at":null,"rejected_by":null,"rejected_by_id":null,"completed_by":"provider","completed_by_id":22,"deleted_at":"2026-08-03T09:00:00Z","created_at":"2026-06-20T09:00:00Z","updated_at":"2026-08-03T09:00:00Z"}"#;
