use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use psg_common::{Secret, Vnd};
use shop_payment_engine::db_types::{Order, OrderId, OrderStatusType, PaymentMethod, ShippingInfo, TxnRef};

use crate::{
    auth::{Role, TokenIssuer},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-test-secret-0123456789abcdef".to_string()) }
}

pub fn issue_token(user_id: &str, roles: Vec<Role>) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, roles).expect("Failed to sign token")
}

/// An order as the store would return it, for wiring up mock expectations.
pub fn stored_order(id: i64, user_id: &str, status: OrderStatusType, txn_ref: Option<&str>) -> Order {
    Order {
        id,
        order_id: OrderId(format!("PSG24060100000{id}")),
        user_id: user_id.to_string(),
        shipping: ShippingInfo {
            name: "Nguyễn Văn A".to_string(),
            email: "a@example.com".to_string(),
            phone: "0901234567".to_string(),
            province: "Hà Nội".to_string(),
            address: "1 Tràng Tiền".to_string(),
            note: None,
        },
        payment_method: if txn_ref.is_some() { PaymentMethod::BankTransfer } else { PaymentMethod::CashOnDelivery },
        total_price: Vnd::from(1_100_000),
        currency: "VND".to_string(),
        txn_ref: txn_ref.map(|t| TxnRef(t.to_string())),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap(),
    }
}

/// Sends the request through an app where `configure`'s routes sit inside the JWT-guarded `/api`
/// scope, mirroring the production layout.
async fn send_authenticated(
    auth_header: &str,
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = req;
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    let req = req.to_request();
    let app = App::new()
        .service(web::scope("/api").wrap(JwtMiddlewareFactory::new(get_auth_config())).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    debug!("Response: {status} {body}");
    Ok((status, body))
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_authenticated(auth_header, TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_authenticated(auth_header, TestRequest::post().uri(path).set_json(body), configure).await
}

pub async fn put_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_authenticated(auth_header, TestRequest::put().uri(path).set_json(body), configure).await
}

/// Sends the request through an app with no authentication middleware at all, for the routes the
/// gateway or internal collaborators call.
pub async fn public_get_request(
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    debug!("Response: {status} {body}");
    Ok((status, body))
}
