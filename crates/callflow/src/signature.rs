//! Webhook signature verification.
//!
//! The call platform signs each webhook body with HMAC-SHA256 under a shared
//! secret and sends the hex digest in the `x-webhook-signature` header. The
//! digest is computed over the raw body bytes, so verification must happen
//! before any JSON parsing touches the payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, warn};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 signature of the request body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// What to do when a secret is configured but the caller sent no signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Reject the request as unauthenticated.
    #[default]
    Reject,
    /// Accept the request and log a warning. For deployments where the
    /// platform cannot yet sign its callbacks.
    AcceptAndWarn,
}

/// Verify the signature of a raw webhook body.
///
/// With no configured secret, verification is skipped entirely and the
/// request is treated as authentic (open mode). A present-but-wrong
/// signature is always rejected; a missing one falls to `policy`.
pub fn verify_signature(
    body: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
    policy: SignaturePolicy,
) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        warn!("webhook secret not configured, skipping signature verification");
        return true;
    };

    let Some(signature) = signature.filter(|s| !s.is_empty()) else {
        return match policy {
            SignaturePolicy::Reject => {
                error!("missing webhook signature");
                false
            }
            SignaturePolicy::AcceptAndWarn => {
                warn!("missing webhook signature, accepting per configured policy");
                true
            }
        };
    };

    let expected = hmac_sha256_hex(body, secret);
    let valid = constant_time_eq(&signature.trim().to_ascii_lowercase(), &expected);
    if !valid {
        error!("invalid webhook signature");
    }
    valid
}

/// HMAC-SHA256 of `body` under `secret`, as lowercase hex.
pub fn hmac_sha256_hex(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Timing-safe comparison to avoid leaking the expected signature
/// through response timing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn round_trip_verifies() {
        let body = br#"{"call_id":"CA1"}"#;
        let signature = hmac_sha256_hex(body, SECRET);

        assert!(verify_signature(
            body,
            Some(&signature),
            Some(SECRET),
            SignaturePolicy::Reject
        ));
    }

    #[test]
    fn flipped_byte_rejected() {
        let body = br#"{"call_id":"CA1"}"#;
        let signature = hmac_sha256_hex(body, SECRET);

        // Flip one hex digit at every position; none may verify.
        for i in 0..signature.len() {
            let mut bytes = signature.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!verify_signature(
                body,
                Some(&tampered),
                Some(SECRET),
                SignaturePolicy::Reject
            ));
        }
    }

    #[test]
    fn wrong_secret_rejected() {
        let body = b"payload";
        let signature = hmac_sha256_hex(body, "other_secret");

        assert!(!verify_signature(
            body,
            Some(&signature),
            Some(SECRET),
            SignaturePolicy::Reject
        ));
    }

    #[test]
    fn open_mode_without_secret() {
        assert!(verify_signature(b"anything", None, None, SignaturePolicy::Reject));
        assert!(verify_signature(
            b"anything",
            Some("deadbeef"),
            None,
            SignaturePolicy::Reject
        ));
    }

    #[test]
    fn missing_signature_follows_policy() {
        let body = b"payload";

        assert!(!verify_signature(body, None, Some(SECRET), SignaturePolicy::Reject));
        assert!(verify_signature(
            body,
            None,
            Some(SECRET),
            SignaturePolicy::AcceptAndWarn
        ));
    }

    #[test]
    fn uppercase_hex_accepted() {
        let body = b"payload";
        let signature = hmac_sha256_hex(body, SECRET).to_ascii_uppercase();

        assert!(verify_signature(
            body,
            Some(&signature),
            Some(SECRET),
            SignaturePolicy::Reject
        ));
    }

    #[test]
    fn digest_is_sha256_hex() {
        let signature = hmac_sha256_hex(b"payload", SECRET);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
