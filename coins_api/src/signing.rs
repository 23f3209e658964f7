//! Request signing.
//!
//! Each request carries three headers: `ACCESS_KEY` (the API key), `ACCESS_NONCE` (a millisecond timestamp that must
//! increase between requests) and `ACCESS_SIGNATURE`, the hex-encoded HMAC-SHA256 of `nonce + url + body` keyed with
//! the API secret.
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::CoinsApiError;

// Header names are case-insensitive; `http` stores them lowercase.
pub const ACCESS_KEY: &str = "access_key";
pub const ACCESS_NONCE: &str = "access_nonce";
pub const ACCESS_SIGNATURE: &str = "access_signature";

type HmacSha256 = Hmac<Sha256>;

pub fn sign_request(secret: &str, nonce: &str, url: &str, body: Option<&str>) -> Result<String, CoinsApiError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| CoinsApiError::SigningError(e.to_string()))?;
    mac.update(nonce.as_bytes());
    mac.update(url.as_bytes());
    if let Some(body) = body {
        mac.update(body.as_bytes());
    }
    Ok(hex::encode(mac.finalize().into_bytes()))
}
