//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
use std::collections::HashMap;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use shop_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::{OrderQueryFilter, OrderRequest},
    traits::{OrderStore, ShopBackend},
    OrderApi,
    ReconcileError,
    ReconcileSuccess,
    ReconcilerApi,
};

use crate::{
    auth::{JwtClaims, Role},
    config::ProxyConfig,
    data_objects::{ConfirmRequest, IpnAck, JsonResponse, PaymentIntentResponse, UpdateStatusRequest},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $bounds:ty) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $bounds + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $bounds:ty where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $bounds + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
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

//--------------------------------------------- Create order ---------------------------------------------------
route!(create_order => Post "/orders" impl ShopBackend where requires [Role::User]);
/// Creates a cash-on-delivery order for the authenticated user.
///
/// The item prices in the request are ignored; every line is priced against the server's catalog
/// and the total is recomputed before anything is stored. The order is created in `Created` status
/// and returned together with its priced items.
pub async fn create_order<A: ShopBackend>(
    claims: JwtClaims,
    body: web::Json<OrderRequest>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let mut request = body.into_inner();
    request.user_id = claims.sub.clone();
    debug!("💻️ POST create_order for user {}", claims.sub);
    let order = api.create_order(request).await?;
    Ok(HttpResponse::Created().json(order))
}

//--------------------------------------------- My orders ------------------------------------------------------
route!(my_orders => Get "/orders/my" impl ShopBackend where requires [Role::User]);
pub async fn my_orders<A: ShopBackend>(
    claims: JwtClaims,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user {}", claims.sub);
    let orders = api.orders_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//--------------------------------------------- Orders search --------------------------------------------------
route!(orders_search => Get "/orders" impl ShopBackend where requires [Role::Admin]);
/// Admins can list all orders, filtered by user, payment method, status list or creation window.
pub async fn orders_search<A: ShopBackend>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET orders search for [{query}]");
    let orders = api.search_orders(query).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//--------------------------------------------- Update status --------------------------------------------------
route!(update_order_status => Put "/orders/{order_id}/status" impl ShopBackend where requires [Role::Admin]);
/// Applies an admin status edge to an order. Only `Created → Fulfilled`, `Created → Cancelled` and
/// `Paid → Fulfilled` are accepted; payment-driven transitions belong to the reconciler and are
/// rejected here with a 400.
pub async fn update_order_status<A: ShopBackend>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let new_status = body.into_inner().status;
    info!("💻️ PUT order status {order_id} -> {new_status}, requested by {}", claims.sub);
    let order = api.update_order_status(&order_id, new_status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//--------------------------------------------- Orders for user ------------------------------------------------
route!(orders_for_user => Get "/api/orders/user/{user_id}" impl ShopBackend);
/// Returns the orders of the given user.
///
/// This route is unauthenticated: it serves the shop's internal collaborators, which sit on the
/// same network segment and are authorized at the perimeter.
pub async fn orders_for_user<A: ShopBackend>(
    path: web::Path<String>,
    api: web::Data<OrderApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ GET orders for user {user_id}");
    let orders = api.orders_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//--------------------------------------------- Payment intent -------------------------------------------------
route!(create_payment_intent => Post "/orders/vnpay" impl ShopBackend where requires [Role::User]);
/// Creates a VNPay payment intent for the authenticated user.
///
/// The order is stored in `AwaitingPayment` with a fresh transaction reference before the signed
/// redirect URL is returned, so a notification can never refer to an unknown order.
pub async fn create_payment_intent<A: ShopBackend>(
    claims: JwtClaims,
    req: HttpRequest,
    body: web::Json<OrderRequest>,
    api: web::Data<OrderApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError> {
    let mut request = body.into_inner();
    request.user_id = claims.sub.clone();
    let client_ip = get_remote_ip(&req, proxy.use_x_forwarded_for, proxy.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    debug!("💻️ POST payment intent for user {} from {client_ip}", claims.sub);
    let (order, intent) = api.create_payment_intent(request, &client_ip).await?;
    let response = PaymentIntentResponse {
        order,
        redirect_url: intent.redirect_url,
        txn_ref: intent.txn_ref.as_str().to_string(),
    };
    Ok(HttpResponse::Created().json(response))
}

//--------------------------------------------- Return confirm -------------------------------------------------
route!(confirm_payment => Post "/orders/vnpay/confirm" impl OrderStore where requires [Role::User]);
/// The Return channel: the storefront posts the query parameters the gateway appended to the
/// return URL. The notification is re-verified and reconciled exactly like an IPN; this endpoint
/// merely translates the outcome into a `{success, message}` body for the buyer's browser.
pub async fn confirm_payment<A: OrderStore>(
    claims: JwtClaims,
    body: web::Json<ConfirmRequest>,
    api: web::Data<ReconcilerApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    if let Some(order_data) = &request.order_data {
        trace!("💻️ Return confirm from {} carried an order blob: {order_data}", claims.sub);
    }
    debug!("💻️ POST payment confirm from user {}", claims.sub);
    let response = match api.handle_return(&request.vnp_params).await {
        Ok(success) => {
            let order = success.order();
            if order.status == OrderStatusType::Paid {
                JsonResponse::success(format!("Order {} has been paid", order.order_id))
            } else {
                JsonResponse::failure(format!("Payment for order {} did not succeed", order.order_id))
            }
        },
        Err(ReconcileError::SignatureInvalid) => {
            return Err(ServerError::InvalidRequestBody("Notification signature is invalid".to_string()))
        },
        Err(ReconcileError::MalformedNotification(m)) => return Err(ServerError::InvalidRequestBody(m)),
        Err(ReconcileError::OrderNotFound(txn_ref)) => {
            return Err(ServerError::NoRecordFound(format!("No order for transaction reference {txn_ref}")))
        },
        Err(e @ ReconcileError::AmountMismatch { .. }) | Err(e @ ReconcileError::ReconciliationConflict { .. }) => {
            JsonResponse::failure(e.to_string())
        },
        Err(ReconcileError::StoreError(e)) => return Err(ServerError::BackendError(e.to_string())),
    };
    Ok(HttpResponse::Ok().json(response))
}

//--------------------------------------------- IPN ------------------------------------------------------------
route!(vnpay_ipn => Get "/api/orders/vnpay_ipn" impl OrderStore);
/// The server-to-server notification endpoint the gateway calls after a payment attempt.
///
/// Whatever the outcome, the response is HTTP 200 with a `{RspCode, Message}` acknowledgement; the
/// gateway retries until it receives one, so transport-level errors would only cause repeat
/// deliveries. Duplicates of an already-recorded outcome are acknowledged with `00` so that the
/// gateway stops resending.
pub async fn vnpay_ipn<A: OrderStore>(
    query: web::Query<HashMap<String, String>>,
    api: web::Data<ReconcilerApi<A>>,
) -> HttpResponse {
    let params = query.into_inner();
    trace!("💻️ Received IPN callback");
    let ack = match api.handle_ipn(&params).await {
        Ok(ReconcileSuccess::Transitioned(_)) => IpnAck::new("00", "Confirm Success"),
        Ok(ReconcileSuccess::Duplicate(_)) => IpnAck::new("00", "Order already confirmed"),
        Err(ReconcileError::SignatureInvalid) => IpnAck::new("97", "Invalid Checksum"),
        Err(ReconcileError::OrderNotFound(_)) => IpnAck::new("01", "Order not found"),
        Err(ReconcileError::AmountMismatch { .. }) => IpnAck::new("04", "Invalid amount"),
        Err(ReconcileError::ReconciliationConflict { .. }) => IpnAck::new("02", "Order already confirmed"),
        Err(ReconcileError::MalformedNotification(m)) => {
            debug!("💻️ Malformed IPN request: {m}");
            IpnAck::new("99", "Invalid request")
        },
        Err(ReconcileError::StoreError(e)) => {
            error!("💻️ IPN handling failed on the backend. {e}");
            IpnAck::new("99", "Unknown error")
        },
    };
    HttpResponse::Ok().json(ack)
}
