//! Webhook signature verification.
//!
//! The sender computes HMAC-SHA256 over the exact request body with the
//! shared secret and sends it as `sha256=<lowercase hex>`. Verification uses
//! the MAC's own constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// `true` iff `header` carries the HMAC-SHA256 of `payload` under `secret`.
///
/// A missing prefix, non-hex digest or wrong-length digest all fail.
pub fn verify_signature(secret: &[u8], payload: &[u8], header: &str) -> bool {
    let Some(digest_hex) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(claimed) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}

/// Header value a sender would attach to `payload`.
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}
