//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// Prefix shared by every metadata cache key.
pub const CACHE_KEY_PREFIX: &str = "repo";

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Cache key for a feed URL: `repo:<sha256>`.
pub fn cache_key(url: &str) -> String {
    format!("{CACHE_KEY_PREFIX}:{}", sha256_hex(url))
}
