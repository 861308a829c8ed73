//! Cryptographic utilities for admin key checks and webhook signatures.

use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes an HMAC-SHA256 of `payload` keyed by `secret`, hex encoded.
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex encoded HMAC-SHA256 signature in constant time.
pub fn verify_hmac_sha256_hex(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Compares two strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_unicode() {
        assert_eq!(sha256_hex("你好世界").len(), 64);
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        let sig = hmac_sha256_hex("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_hmac_roundtrip_and_tamper() {
        let sig = hmac_sha256_hex("whsec_test", b"1700000000.{\"id\":\"evt_1\"}").unwrap();
        assert!(verify_hmac_sha256_hex(
            "whsec_test",
            b"1700000000.{\"id\":\"evt_1\"}",
            &sig
        ));
        assert!(!verify_hmac_sha256_hex(
            "whsec_test",
            b"1700000001.{\"id\":\"evt_1\"}",
            &sig
        ));
        assert!(!verify_hmac_sha256_hex("other", b"1700000000.{\"id\":\"evt_1\"}", &sig));
    }

    #[test]
    fn test_verify_hmac_rejects_non_hex() {
        assert!(!verify_hmac_sha256_hex("secret", b"payload", "not-hex"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
