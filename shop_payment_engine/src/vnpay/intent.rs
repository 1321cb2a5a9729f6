//! Construction of the outbound payment intent: transaction reference and signed redirect URL.
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;

use crate::{
    db_types::{Order, TxnRef},
    vnpay::{signing, VnPayConfig},
};

/// VNPay timestamps are expressed in Vietnam local time (UTC+7).
const VIETNAM_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// The result of building a payment intent. `txn_ref` must already be durably attached to the
/// order before `redirect_url` is handed to the buyer.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub redirect_url: String,
    pub txn_ref: TxnRef,
}

/// Generates a transaction reference: a second-resolution timestamp plus a random suffix, unique
/// enough to avoid collision within the gateway's dedup window. Uniqueness across all orders is
/// ultimately enforced by the store's unique constraint.
pub fn new_txn_ref() -> TxnRef {
    let ts = Utc::now().format("%y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    TxnRef(format!("{ts}{suffix:06}"))
}

fn format_create_date(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(VIETNAM_UTC_OFFSET_SECS).expect("static UTC+7 offset is valid");
    now.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string()
}

/// Builds the signed redirect URL for the given (already persisted) payment-intent order.
///
/// The amount is scaled through [`psg_common::Vnd::to_gateway_amount`]; the same scaling is
/// applied when verifying inbound notifications, so the convention holds uniformly.
pub fn build_redirect_url(config: &VnPayConfig, order: &Order, txn_ref: &TxnRef, client_ip: &str) -> String {
    let mut params = HashMap::new();
    params.insert("vnp_Version".to_string(), config.api_version.clone());
    params.insert("vnp_Command".to_string(), "pay".to_string());
    params.insert("vnp_TmnCode".to_string(), config.tmn_code.clone());
    params.insert("vnp_Amount".to_string(), order.total_price.to_gateway_amount().to_string());
    params.insert("vnp_CurrCode".to_string(), order.currency.clone());
    params.insert("vnp_TxnRef".to_string(), txn_ref.as_str().to_string());
    params.insert("vnp_OrderInfo".to_string(), format!("Thanh toan don hang {}", order.order_id.as_str()));
    params.insert("vnp_OrderType".to_string(), "other".to_string());
    params.insert("vnp_Locale".to_string(), "vn".to_string());
    params.insert("vnp_ReturnUrl".to_string(), config.return_url.clone());
    params.insert("vnp_IpAddr".to_string(), client_ip.to_string());
    params.insert("vnp_CreateDate".to_string(), format_create_date(Utc::now()));
    let hash = signing::sign(&params, config.hash_secret.reveal());
    let query = signing::canonical_payload(&params);
    format!("{}?{}&{}={}", config.payment_url, query, signing::SECURE_HASH_FIELD, hash)
}
