use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header LINE puts the body signature in.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// `base64(HMAC-SHA256(channel_secret, body))`, the value LINE sends for `body`.
pub fn sign(channel_secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(channel_secret).ok()?;
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time check of `signature` against `body`. Undecodable signatures never match.
pub fn is_valid(channel_secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{is_valid, sign};

    const SECRET: &[u8] = b"channel-secret";
    const BODY: &[u8] = br#"{"destination":"U0","events":[]}"#;

    #[test]
    fn signature_round_trips() {
        let signature = sign(SECRET, BODY).expect("any key length is accepted");
        assert!(is_valid(SECRET, BODY, &signature));
    }

    #[test]
    fn matches_known_hmac_vector() {
        // RFC 4231 test case 2, base64 encoded.
        let signature = sign(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(signature.as_deref(), Some("W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = sign(SECRET, BODY).expect("any key length is accepted");
        assert!(!is_valid(SECRET, br#"{"destination":"U1","events":[]}"#, &signature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signature = sign(b"other-secret", BODY).expect("any key length is accepted");
        assert!(!is_valid(SECRET, BODY, &signature));
    }

    #[test]
    fn garbage_signature_is_rejected() {
        assert!(!is_valid(SECRET, BODY, "not base64 at all!"));
        assert!(!is_valid(SECRET, BODY, ""));
    }
}
