//! Cryptographic utilities for webhook verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// # Panics
///
/// Never panics in practice: HMAC-SHA256 accepts keys of any size per
/// RFC 2104, so `new_from_slice` only fails if the implementation is broken.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a `Stripe-Signature` style header against a signing secret.
///
/// Header format: `t=<timestamp>,v1=<signature>[,v1=<signature2>...]`.
/// The signed payload is `<timestamp>.<body>`. Accepts if any `v1`
/// signature matches.
pub fn verify_provider_signature(body: &str, header: &str, secret: &str) -> Result<(), String> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| "Missing timestamp".to_string())?;
    if signatures.is_empty() {
        return Err("Missing v1 signature".into());
    }

    let signed_payload = format!("{timestamp}.{body}");
    let expected = hmac_sha256_hex(secret, &signed_payload);

    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err("Signature mismatch".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_produces_correct_length() {
        let result = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog");
        assert_eq!(result.len(), 64);
    }

    #[test]
    fn hmac_sha256_is_deterministic() {
        assert_eq!(
            hmac_sha256_hex("secret", "message"),
            hmac_sha256_hex("secret", "message")
        );
        assert_ne!(
            hmac_sha256_hex("secret", "message1"),
            hmac_sha256_hex("secret", "message2")
        );
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }

    #[test]
    fn signed_header_roundtrip() {
        let secret = "whsec_test";
        let body = r#"{"type":"product.created"}"#;
        let sig = hmac_sha256_hex(secret, &format!("1700000000.{body}"));
        let header = format!("t=1700000000,v1={sig}");

        assert!(verify_provider_signature(body, &header, secret).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let secret = "whsec_test";
        let sig = hmac_sha256_hex(secret, "1700000000.original");
        let header = format!("t=1700000000,v1={sig}");

        assert!(verify_provider_signature("tampered", &header, secret).is_err());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(verify_provider_signature("body", "not-a-header", "secret").is_err());
        assert!(verify_provider_signature("body", "t=123", "secret").is_err());
        assert!(verify_provider_signature("body", "v1=abc", "secret").is_err());
    }

    #[test]
    fn any_matching_v1_signature_is_accepted() {
        let secret = "whsec_test";
        let body = "payload";
        let good = hmac_sha256_hex(secret, &format!("1.{body}"));
        let header = format!("t=1,v1=deadbeef,v1={good}");

        assert!(verify_provider_signature(body, &header, secret).is_ok());
    }
}
