//! Device API key hashing.
//!
//! Equipment authenticates with a plaintext key in `X-API-Key`; only its
//! SHA-256 hex digest is stored.

use sha2::{Digest, Sha256};

/// Header carrying the device key.
pub const DEVICE_KEY_HEADER: &str = "x-api-key";

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Digest stored in `equipment.api_key_hash` for a plaintext key.
pub fn hash_device_key(plaintext: &str) -> String {
    sha256_hex(plaintext.trim().as_bytes())
}
