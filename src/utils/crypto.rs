use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use ring::hmac;

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp_ms() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Config(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in u64
    if duration > u64::MAX as u128 {
        return Err(BlockchainError::Config("Timestamp overflow".to_string()));
    }

    Ok(duration as u64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 of `data`, hex-encoded
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    HEXLOWER
        .decode(data.as_bytes())
        .map_err(|e| BlockchainError::Serialization(format!("Invalid hex encoding: {e}")))
}

/// HMAC-SHA256 over `payload` keyed by the UTF-8 bytes of `key`, hex-encoded.
///
/// The key is the sender's identifier, so a verifier holds the same material
/// as the signer. That makes this a liveness check rather than real
/// authentication; it stands in for an asymmetric scheme.
pub fn hmac_sha256_sign(payload: &str, key: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key.as_bytes());
    let tag = hmac::sign(&key, payload.as_bytes());
    HEXLOWER.encode(tag.as_ref())
}

/// Verify a hex HMAC-SHA256 signature in constant time.
pub fn hmac_sha256_verify(payload: &str, signature: &str, key: &str) -> bool {
    let tag = match hex_decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, key.as_bytes());
    hmac::verify(&key, payload.as_bytes(), &tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty byte string
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_deterministic() {
        assert_eq!(sha256_digest(b"artwork"), sha256_digest(b"artwork"));
        assert_ne!(sha256_digest(b"artwork"), sha256_digest(b"artworks"));
    }

    #[test]
    fn test_hmac_sign_verify_roundtrip() {
        let sig = hmac_sha256_sign("Alice|Bob|MonaLisa", "Alice");
        assert_eq!(sig.len(), 64);
        assert!(hmac_sha256_verify("Alice|Bob|MonaLisa", &sig, "Alice"));
    }

    #[test]
    fn test_hmac_verify_rejects_wrong_key() {
        let sig = hmac_sha256_sign("Alice|Bob|MonaLisa", "Alice");
        assert!(!hmac_sha256_verify("Alice|Bob|MonaLisa", &sig, "Mallory"));
    }

    #[test]
    fn test_hmac_verify_rejects_tampered_payload() {
        let sig = hmac_sha256_sign("Alice|Bob|MonaLisa", "Alice");
        assert!(!hmac_sha256_verify("Alice|Bob|Forgery", &sig, "Alice"));
    }

    #[test]
    fn test_hmac_verify_rejects_non_hex_signature() {
        assert!(!hmac_sha256_verify("payload", "not hex at all", "key"));
    }
}
