//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **BLAKE3**: digests and multisig addresses. Everything channel-native
//!   that needs a commitment goes through [`blake3_tagged`], which prefixes a
//!   domain tag and length-prefixes each part so that no two different inputs
//!   can share an encoding.
//!
//! - **SHA-256**: bundle hashes, computed as `SHA-256(SHA-256(data))` in the
//!   same way ledger transaction IDs usually are. The bundle hash is what every
//!   signature fragment commits to.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// # Example
///
/// ```
/// use flash_channel::crypto::double_sha256;
///
/// let bundle_hash = double_sha256(b"canonical bundle bytes");
/// assert_eq!(bundle_hash.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 over a domain tag followed by length-prefixed parts.
///
/// Each part is written as `len (u64 LE) ‖ bytes`, so `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
pub fn blake3_tagged(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(domain.len() as u64).to_le_bytes());
    hasher.update(domain);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
