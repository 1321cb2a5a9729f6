//! VNPay integration: the shared-secret signing scheme and the outbound payment-intent URL.
//!
//! VNPay is a redirect gateway. The merchant signs an outbound parameter set and sends the buyer
//! to the gateway; the outcome comes back through two independent channels (the browser Return and
//! the server-to-server IPN), each carrying the same kind of signed parameter set. Everything that
//! crosses that boundary goes through [`signing`].
use std::env;

use log::*;
use psg_common::Secret;

pub mod intent;
pub mod signing;

const DEFAULT_PAYMENT_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";
const DEFAULT_API_VERSION: &str = "2.1.0";

#[derive(Clone, Debug, Default)]
pub struct VnPayConfig {
    /// The merchant terminal code assigned by VNPay.
    pub tmn_code: String,
    /// The shared secret for the HMAC-SHA512 signature scheme.
    pub hash_secret: Secret<String>,
    /// The gateway endpoint the buyer is redirected to.
    pub payment_url: String,
    /// The URL the gateway redirects the buyer back to (the Return channel).
    pub return_url: String,
    pub api_version: String,
}

impl VnPayConfig {
    pub fn from_env_or_default() -> Self {
        let tmn_code = env::var("PSG_VNPAY_TMN_CODE").ok().unwrap_or_else(|| {
            error!("🏦️ PSG_VNPAY_TMN_CODE is not set. Please set it to your VNPay terminal code.");
            String::default()
        });
        let hash_secret = env::var("PSG_VNPAY_HASH_SECRET").ok().unwrap_or_else(|| {
            error!("🏦️ PSG_VNPAY_HASH_SECRET is not set. Please set it to your VNPay HMAC secret.");
            String::default()
        });
        let payment_url = env::var("PSG_VNPAY_PAYMENT_URL").ok().unwrap_or_else(|| {
            info!("🏦️ PSG_VNPAY_PAYMENT_URL is not set. Using the sandbox gateway.");
            DEFAULT_PAYMENT_URL.to_string()
        });
        let return_url = env::var("PSG_VNPAY_RETURN_URL").ok().unwrap_or_else(|| {
            error!("🏦️ PSG_VNPAY_RETURN_URL is not set. Buyers cannot be redirected back to the storefront.");
            String::default()
        });
        Self {
            tmn_code,
            hash_secret: Secret::new(hash_secret),
            payment_url,
            return_url,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}
