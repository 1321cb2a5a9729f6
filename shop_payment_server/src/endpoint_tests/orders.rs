use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use psg_common::Vnd;
use serde_json::json;
use shop_payment_engine::{
    db_types::{OrderStatusType, Product},
    vnpay::VnPayConfig,
    OrderApi,
};

use super::helpers::{get_request, issue_token, post_request, put_request, stored_order};
use crate::{
    auth::Role,
    endpoint_tests::mocks::MockBackend,
    routes::{CreateOrderRoute, MyOrdersRoute, OrdersSearchRoute, UpdateOrderStatusRoute},
};

fn product(id: &str, price: i64) -> Product {
    Product {
        id: id.to_string(),
        name: id.to_string(),
        price: Vnd::from(price),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
}

fn order_body() -> serde_json::Value {
    json!({
        "items": [
            { "product_id": "gpu-4070", "quantity": 1 },
            { "product_id": "ram-32g", "quantity": 2 }
        ],
        "shipping": {
            "name": "Nguyễn Văn A",
            "email": "a@example.com",
            "phone": "0901234567",
            "province": "Hà Nội",
            "address": "1 Tràng Tiền",
            "note": null
        },
        "payment_method": "CashOnDelivery"
    })
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_product().returning(|id| match id {
        "gpu-4070" => Ok(Some(product("gpu-4070", 500_000))),
        "ram-32g" => Ok(Some(product("ram-32g", 300_000))),
        _ => Ok(None),
    });
    backend.expect_insert_order().returning(|order| {
        let mut stored = stored_order(1, &order.user_id, order.status, None);
        stored.total_price = order.total_price;
        Ok(stored)
    });
    backend.expect_fetch_order_items().returning(|_| Ok(vec![]));
    backend.expect_fetch_orders_for_user().returning(|user_id| {
        Ok(vec![stored_order(1, user_id, OrderStatusType::Created, None)])
    });
    backend.expect_search_orders().returning(|_| {
        Ok(vec![
            stored_order(1, "alice", OrderStatusType::Created, None),
            stored_order(2, "bob", OrderStatusType::Paid, Some("240601133000123456")),
        ])
    });
    backend
        .expect_fetch_order_by_id()
        .returning(|order_id| Ok(Some({
            let mut o = stored_order(1, "alice", OrderStatusType::Created, None);
            o.order_id = order_id.clone();
            o
        })));
    backend.expect_update_order_status().returning(|id, _expected, new| {
        Ok(Some(stored_order(id, "alice", new, None)))
    });
    let api = OrderApi::new(backend, VnPayConfig::default());
    cfg.service(CreateOrderRoute::<MockBackend>::new())
        .service(MyOrdersRoute::<MockBackend>::new())
        .service(OrdersSearchRoute::<MockBackend>::new())
        .service(UpdateOrderStatusRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn create_order_without_a_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let err = post_request("", "/api/orders", order_body(), configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No access token was provided.");
}

#[actix_web::test]
async fn create_order_with_a_tampered_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token("alice", vec![Role::User]);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let err = post_request(&token, "/api/orders", order_body(), configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error."), "unexpected error: {err}");
}

#[actix_web::test]
async fn create_order_as_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = post_request(&token, "/api/orders", order_body(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    // Totals are recomputed from the catalog: 500k + 2 x 300k.
    assert!(body.contains("\"total_price\":1100000"), "body was {body}");
    assert!(body.contains("\"status\":\"Created\""), "body was {body}");
    assert!(body.contains("\"user_id\":\"alice\""), "body was {body}");
}

#[actix_web::test]
async fn create_order_with_unknown_product_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let mut body = order_body();
    body["items"][0]["product_id"] = json!("gpu-9999");
    // Handler errors come back as a rendered error response, not a service failure.
    let (status, body) = post_request(&token, "/api/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Product gpu-9999 does not exist in the catalog"), "body was {body}");
}

#[actix_web::test]
async fn create_order_with_no_items_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let mut body = order_body();
    body["items"] = json!([]);
    let (status, body) = post_request(&token, "/api/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("no items"), "body was {body}");
}

#[actix_web::test]
async fn users_see_their_own_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/api/orders/my", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"user_id\":\"alice\""), "body was {body}");
}

#[actix_web::test]
async fn search_requires_the_admin_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let err = get_request(&token, "/api/orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn admins_can_search_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("root", vec![Role::User, Role::Admin]);
    let (status, body) =
        get_request(&token, "/api/orders?status=Paid,Created", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"user_id\":\"alice\"") && body.contains("\"user_id\":\"bob\""), "body was {body}");
}

#[actix_web::test]
async fn admins_can_fulfil_an_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("root", vec![Role::Admin]);
    let (status, body) = put_request(
        &token,
        "/api/orders/PSG240601000001/status",
        json!({ "status": "Fulfilled" }),
        configure,
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"Fulfilled\""), "body was {body}");
}

#[actix_web::test]
async fn users_cannot_change_order_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User]);
    let err = put_request(&token, "/api/orders/PSG240601000001/status", json!({ "status": "Cancelled" }), configure)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}
