//! HMAC-SHA256 payload integrity for providers that verify a signature
//! header over the request body. The digest covers the canonical JSON
//! serialization and travels in a header, never inside the signed body.

use crate::domain::error::PaymentError;
use ring::hmac;
use serde::Serialize;

pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hex::encode(hmac::sign(&key, message))
}

/// Serialize `payload` to compact JSON (struct field order is preserved) and
/// sign it. Returns the exact body to send and the hex digest for the
/// signature header; signing a re-serialization would not be guaranteed to
/// match.
pub fn sign_payload<T: Serialize>(
    secret: &[u8],
    payload: &T,
) -> Result<(String, String), PaymentError> {
    let body = serde_json::to_string(payload).map_err(|_| PaymentError::MalformedResponse)?;
    let digest = hmac_sha256_hex(secret, body.as_bytes());
    Ok((body, digest))
}

pub fn verify_hmac_sha256(secret: &[u8], message: &[u8], signature_hex: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    match hex::decode(signature_hex) {
        Ok(signature) => hmac::verify(&key, message, &signature).is_ok(),
        Err(_) => false,
    }
}
