use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use festa_booking_engine::{OrderFlowApi, OrdersApi, PaymentsApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::paymob::PaymobGateway,
    paymob_routes::PaymobWebhookRoute,
    routes::{
        health,
        AcceptOrderRoute,
        CancelOrderRoute,
        CompleteOrderRoute,
        CreateOrderRoute,
        DeleteOrderRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        OrderPaymentsRoute,
        OrdersSearchRoute,
        PaymentByIdRoute,
        ProviderOrdersRoute,
        RejectOrderRoute,
        RequestDepositRoute,
        StartOrderRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // A gateway that cannot even build its HTTP client is a config problem; fail before binding.
    let gateway =
        PaymobGateway::new(config.paymob.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let srv = HttpServer::new(move || {
        let order_flow_api = OrderFlowApi::new(db.clone(), gateway.clone());
        let orders_api = OrdersApi::new(db.clone());
        let payments_api = PaymentsApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fbs::access_log"))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api));
        // Routes that require identity headers
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(ProviderOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(RequestDepositRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(AcceptOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(StartOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(CompleteOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(RejectOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(CancelOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(DeleteOrderRoute::<SqliteDatabase, PaymobGateway>::new())
            .service(OrderPaymentsRoute::<SqliteDatabase>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new())
            .service(PaymentByIdRoute::<SqliteDatabase>::new());
        // The gateway authenticates itself by what it knows (our order ids), not by headers
        let webhook_scope =
            web::scope("/webhooks").service(PaymobWebhookRoute::<SqliteDatabase, PaymobGateway>::new());
        app.service(api_scope).service(webhook_scope).service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
