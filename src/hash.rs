//! Content hashing and hash-string validation.
//!
//! The object store, refs, and diff engine are all written against this one
//! module so the hash algorithm can be swapped later without touching them.

use sha1::{Digest, Sha1};

/// Length in ASCII characters of a hash string (SHA-1, hex-encoded).
pub const HASH_LENGTH: usize = 40;

const HASH_CHARSET: &str = "0123456789abcdef";

/// Hash raw bytes, returning the lowercase hex digest.
///
/// This hashes the content only, never the loose-object header -- matching
/// how blob identity is defined (two blobs with identical bytes are the same
/// object regardless of how they end up stored on disk).
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Validate that `s` has the right length and character set to be a hash.
pub fn is_valid_hash(s: &str) -> bool {
    s.len() == HASH_LENGTH && s.chars().all(|c| HASH_CHARSET.contains(c))
}
