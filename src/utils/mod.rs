//! Utility functions and helpers
//!
//! Cryptographic primitives and encoding helpers used throughout the
//! registry.

pub mod crypto;

pub use crypto::{
    current_timestamp_ms, hex_decode, hmac_sha256_sign, hmac_sha256_verify, sha256_digest,
    sha256_hex,
};
