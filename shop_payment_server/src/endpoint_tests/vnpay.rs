use std::collections::HashMap;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use psg_common::Secret;
use shop_payment_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    vnpay::{signing, VnPayConfig},
    ReconcilerApi,
};

use super::helpers::{public_get_request, stored_order};
use crate::{data_objects::IpnAck, endpoint_tests::mocks::MockBackend, routes::VnpayIpnRoute};

const HASH_SECRET: &str = "ENDPOINT-TEST-HMAC-SECRET-00000000";
const AWAITING_REF: &str = "240601133000111111";
const PAID_REF: &str = "240601133000222222";
const FULFILLED_REF: &str = "240601133000333333";

fn gateway_config() -> VnPayConfig {
    VnPayConfig {
        tmn_code: "PSGTEST1".to_string(),
        hash_secret: Secret::new(HASH_SECRET.to_string()),
        payment_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
        return_url: "https://shop.example.com/payment/return".to_string(),
        api_version: "2.1.0".to_string(),
    }
}

/// Builds the IPN query string the gateway would send, signed with the shared secret.
fn ipn_query(txn_ref: &str, amount: i64, response_code: &str) -> String {
    let mut params = HashMap::new();
    params.insert("vnp_TmnCode".to_string(), "PSGTEST1".to_string());
    params.insert("vnp_TxnRef".to_string(), txn_ref.to_string());
    params.insert("vnp_Amount".to_string(), amount.to_string());
    params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
    params.insert("vnp_TransactionNo".to_string(), "14000001".to_string());
    let hash = signing::sign(&params, HASH_SECRET);
    params.insert(signing::SECURE_HASH_FIELD.to_string(), hash);
    let mut pairs = params.into_iter().collect::<Vec<_>>();
    pairs.sort();
    pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// The mock store knows two orders: one awaiting payment and one already paid, both over
/// 1,100,000 VND (110,000,000 in gateway units).
fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_by_txn_ref().returning(|txn_ref| match txn_ref.as_str() {
        AWAITING_REF => Ok(Some(stored_order(1, "alice", OrderStatusType::AwaitingPayment, Some(AWAITING_REF)))),
        PAID_REF => Ok(Some(stored_order(2, "bob", OrderStatusType::Paid, Some(PAID_REF)))),
        FULFILLED_REF => Ok(Some(stored_order(3, "bob", OrderStatusType::Fulfilled, Some(FULFILLED_REF)))),
        _ => Ok(None),
    });
    backend.expect_update_order_status().returning(|id, _expected, new| {
        Ok(Some(stored_order(id, "alice", new, Some(AWAITING_REF))))
    });
    let api = ReconcilerApi::new(backend, gateway_config(), EventProducers::default());
    cfg.service(VnpayIpnRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

async fn ipn_ack(query: &str) -> IpnAck {
    let path = format!("/api/orders/vnpay_ipn?{query}");
    let (status, body) = public_get_request(&path, configure).await.expect("Request failed");
    // The gateway contract: the ack always travels on HTTP 200.
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).expect("ack should be valid JSON")
}

#[actix_web::test]
async fn successful_payment_is_confirmed() {
    let _ = env_logger::try_init().ok();
    let ack = ipn_ack(&ipn_query(AWAITING_REF, 110_000_000, "00")).await;
    assert_eq!(ack, IpnAck::new("00", "Confirm Success"));
}

#[actix_web::test]
async fn duplicate_of_recorded_outcome_still_acks_success() {
    let _ = env_logger::try_init().ok();
    let ack = ipn_ack(&ipn_query(PAID_REF, 110_000_000, "00")).await;
    assert_eq!(ack, IpnAck::new("00", "Order already confirmed"));
}

#[actix_web::test]
async fn retried_success_after_fulfilment_still_acks_success() {
    let _ = env_logger::try_init().ok();
    // The order has shipped since it was paid; the gateway's late retry is still a duplicate.
    let ack = ipn_ack(&ipn_query(FULFILLED_REF, 110_000_000, "00")).await;
    assert_eq!(ack, IpnAck::new("00", "Order already confirmed"));
}

#[actix_web::test]
async fn tampered_signature_acks_97() {
    let _ = env_logger::try_init().ok();
    let query = ipn_query(AWAITING_REF, 110_000_000, "24").replace("vnp_ResponseCode=24", "vnp_ResponseCode=00");
    let ack = ipn_ack(&query).await;
    assert_eq!(ack.rsp_code, "97");
}

#[actix_web::test]
async fn unknown_order_acks_01() {
    let _ = env_logger::try_init().ok();
    let ack = ipn_ack(&ipn_query("240601000000999999", 110_000_000, "00")).await;
    assert_eq!(ack.rsp_code, "01");
}

#[actix_web::test]
async fn wrong_amount_acks_04() {
    let _ = env_logger::try_init().ok();
    let ack = ipn_ack(&ipn_query(AWAITING_REF, 55_000_000, "00")).await;
    assert_eq!(ack.rsp_code, "04");
}

#[actix_web::test]
async fn contradicting_outcome_acks_02() {
    let _ = env_logger::try_init().ok();
    // The stored order is Paid; the gateway now claims the payment failed.
    let ack = ipn_ack(&ipn_query(PAID_REF, 110_000_000, "24")).await;
    assert_eq!(ack.rsp_code, "02");
}

#[actix_web::test]
async fn missing_parameters_ack_99() {
    let _ = env_logger::try_init().ok();
    // Signed, but with no amount field at all.
    let mut params = HashMap::new();
    params.insert("vnp_TxnRef".to_string(), AWAITING_REF.to_string());
    params.insert("vnp_ResponseCode".to_string(), "00".to_string());
    let hash = signing::sign(&params, HASH_SECRET);
    params.insert(signing::SECURE_HASH_FIELD.to_string(), hash);
    let query =
        params.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let ack = ipn_ack(&query).await;
    assert_eq!(ack.rsp_code, "99");
}
