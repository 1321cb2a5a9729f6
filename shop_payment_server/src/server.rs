use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use shop_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderApi,
    ReconcilerApi,
    SqliteDatabase,
};

use crate::{
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        ConfirmPaymentRoute,
        CreateOrderRoute,
        CreatePaymentIntentRoute,
        MyOrdersRoute,
        OrdersForUserRoute,
        OrdersSearchRoute,
        UpdateOrderStatusRoute,
        VnpayIpnRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("🎉️ Order {} has been paid by {}", ev.order.order_id, ev.order.user_id);
        })
    });
    let handlers = EventHandlers::new(64, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderApi::new(db.clone(), config.vnpay.clone())
            .with_catalog_timeout(Duration::from_secs(config.catalog_timeout_secs));
        let reconciler_api = ReconcilerApi::new(db.clone(), config.vnpay.clone(), producers.clone());
        let proxy_config =
            ProxyConfig { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded };
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("psg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(reconciler_api))
            .app_data(web::Data::new(proxy_config));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(config.auth.clone()))
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(CreatePaymentIntentRoute::<SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new());
        // The gateway's IPN callback and the collaborator projection carry no bearer token, so
        // they are registered before the authenticated scope under their full paths.
        app.service(health)
            .service(VnpayIpnRoute::<SqliteDatabase>::new())
            .service(OrdersForUserRoute::<SqliteDatabase>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
