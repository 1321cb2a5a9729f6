use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use shop_payment_engine::{db_types::OrderStatusType, order_objects::FullOrder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The acknowledgement body the gateway expects from the IPN endpoint. Field names are part of the
/// VNPay wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnAck {
    pub fn new<S: Display>(rsp_code: &str, message: S) -> Self {
        Self { rsp_code: rsp_code.to_string(), message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatusType,
}

/// The response to a payment-intent request: the order as recorded, plus where to send the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub order: FullOrder,
    pub redirect_url: String,
    pub txn_ref: String,
}

/// The body of the Return-channel confirm call. The storefront forwards the query parameters the
/// gateway appended to the return URL, plus whatever order blob it kept across the redirect. The
/// blob is ignored beyond logging; everything is re-verified server-side from `vnp_params`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub vnp_params: HashMap<String, String>,
    #[serde(default)]
    pub order_data: Option<serde_json::Value>,
}
