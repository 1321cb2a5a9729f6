//! The VNPay shared-secret signing scheme.
//!
//! The canonical signing input is built by excluding the signature fields themselves, sorting the
//! remaining keys lexicographically, form-urlencoding each key and value, and joining the
//! `key=value` pairs with `&`. The signature is the HMAC-SHA512 of that string under the shared
//! secret, rendered as uppercase hex.
//!
//! Verification fails closed: a missing or undecodable signature returns `false`, never an error.
use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use url::form_urlencoded;

type HmacSha512 = Hmac<Sha512>;

/// The parameter carrying the signature itself. Always excluded from the signing input.
pub const SECURE_HASH_FIELD: &str = "vnp_SecureHash";
/// Legacy companion field some gateway versions send. Also excluded from the signing input.
pub const SECURE_HASH_TYPE_FIELD: &str = "vnp_SecureHashType";

fn urlencode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the canonical signing input from the given parameters.
pub fn canonical_payload(params: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> =
        params.keys().filter(|k| *k != SECURE_HASH_FIELD && *k != SECURE_HASH_TYPE_FIELD).collect();
    keys.sort();
    keys.into_iter()
        .map(|k| format!("{}={}", urlencode(k), urlencode(&params[k])))
        .collect::<Vec<_>>()
        .join("&")
}

fn mac_for(secret: &str, payload: &str) -> HmacSha512 {
    // HMAC accepts keys of arbitrary length, so this cannot fail.
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    mac
}

/// Signs the parameter set with the shared secret. The result goes into `vnp_SecureHash`.
pub fn sign(params: &HashMap<String, String>, secret: &str) -> String {
    let payload = canonical_payload(params);
    let mac = mac_for(secret, &payload);
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Verifies the `vnp_SecureHash` parameter against the rest of the parameter set.
///
/// The supplied signature is hex-decoded and compared in constant time, so both the uppercase hex
/// this engine emits and the lowercase hex some gateway deployments send verify.
pub fn verify(params: &HashMap<String, String>, secret: &str) -> bool {
    let supplied = match params.get(SECURE_HASH_FIELD) {
        Some(s) => s,
        None => return false,
    };
    let supplied = match hex::decode(supplied) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let payload = canonical_payload(params);
    mac_for(secret, &payload).verify_slice(&supplied).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "VNPAYSECRETKEY123";

    fn sample_params() -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("vnp_TxnRef".to_string(), "240601123456042".to_string());
        params.insert("vnp_Amount".to_string(), "110000000".to_string());
        params.insert("vnp_ResponseCode".to_string(), "00".to_string());
        params.insert("vnp_OrderInfo".to_string(), "Thanh toan don hang 42".to_string());
        params
    }

    fn signed_params() -> HashMap<String, String> {
        let mut params = sample_params();
        let hash = sign(&params, SECRET);
        params.insert(SECURE_HASH_FIELD.to_string(), hash);
        params
    }

    #[test]
    fn canonical_payload_is_sorted_and_encoded() {
        let payload = canonical_payload(&sample_params());
        assert_eq!(
            payload,
            "vnp_Amount=110000000&vnp_OrderInfo=Thanh+toan+don+hang+42&vnp_ResponseCode=00&vnp_TxnRef=240601123456042"
        );
    }

    #[test]
    fn signature_fields_are_excluded_from_the_payload() {
        let with_hash = signed_params();
        let mut with_hash_type = with_hash.clone();
        with_hash_type.insert(SECURE_HASH_TYPE_FIELD.to_string(), "HmacSHA512".to_string());
        assert_eq!(canonical_payload(&with_hash), canonical_payload(&sample_params()));
        assert_eq!(canonical_payload(&with_hash_type), canonical_payload(&sample_params()));
    }

    #[test]
    fn valid_signature_verifies() {
        assert!(verify(&signed_params(), SECRET));
    }

    #[test]
    fn lowercase_signature_verifies() {
        let mut params = signed_params();
        let lower = params[SECURE_HASH_FIELD].to_lowercase();
        params.insert(SECURE_HASH_FIELD.to_string(), lower);
        assert!(verify(&params, SECRET));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert!(!verify(&signed_params(), "someothersecret"));
    }

    #[test]
    fn tampering_with_any_field_is_detected() {
        for key in ["vnp_TxnRef", "vnp_Amount", "vnp_ResponseCode", "vnp_OrderInfo"] {
            let mut params = signed_params();
            params.insert(key.to_string(), "tampered".to_string());
            assert!(!verify(&params, SECRET), "tampered {key} still verified");
        }
    }

    #[test]
    fn missing_or_garbage_signature_fails_closed() {
        assert!(!verify(&sample_params(), SECRET));
        let mut params = sample_params();
        params.insert(SECURE_HASH_FIELD.to_string(), "not-hex".to_string());
        assert!(!verify(&params, SECRET));
    }
}
