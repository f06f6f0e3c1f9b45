//! Hashing utilities for the miner
//!
//! Provides consistent hashing implementations used across the crate.
//!
//! ## Performance (BLAKE3 vs SHA-256)
//!
//! | Algorithm | Speed | Use Case |
//! |-----------|-------|----------|
//! | SHA-256 | ~500 MB/s | Block identity, body digest |
//! | BLAKE3 | ~3000 MB/s | Alternative PoW engine |

use primitive_types::{H256, U256};
use sha2::{Digest, Sha256};

/// Length of the canonical header encoding in bytes.
pub const HEADER_ENCODED_LEN: usize = 32 * 4 + 8 + 4;

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute double SHA-256 hash (Bitcoin-style)
#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first_hash = sha256(data);
    sha256(&first_hash)
}

/// Compute BLAKE3 hash
#[inline]
pub fn blake3(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Compute double BLAKE3 hash (for PoW when BLAKE3 algorithm is selected)
#[inline]
pub fn blake3d(data: &[u8]) -> [u8; 32] {
    let first_hash = blake3(data);
    blake3(&first_hash)
}

/// Convert hash bytes to H256
#[inline]
pub fn bytes_to_h256(bytes: &[u8; 32]) -> H256 {
    H256::from(*bytes)
}

/// Convert hash bytes to U256 (big-endian)
#[inline]
pub fn bytes_to_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_big_endian(bytes)
}

/// Serialize block header for hashing
///
/// Fixed-width layout: three hashes, the target as 32 big-endian bytes,
/// then little-endian timestamp and nonce.
pub fn serialize_block_header(
    prev_hash: &H256,
    body_hash: &H256,
    accounts_hash: &H256,
    target: U256,
    timestamp: u64,
    nonce: u32,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_ENCODED_LEN);

    bytes.extend_from_slice(prev_hash.as_bytes());
    bytes.extend_from_slice(body_hash.as_bytes());
    bytes.extend_from_slice(accounts_hash.as_bytes());

    let mut target_bytes = [0u8; 32];
    target.to_big_endian(&mut target_bytes);
    bytes.extend_from_slice(&target_bytes);

    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes.extend_from_slice(&nonce.to_le_bytes());

    bytes
}

/// Check if hash meets the target
///
/// Returns true if hash < target (lower target = harder)
#[inline]
pub fn meets_target(hash: &H256, target: U256) -> bool {
    U256::from_big_endian(hash.as_bytes()) < target
}

/// Render a target for logs as a power of two, e.g. `~2^240`.
pub fn describe_target(target: U256) -> String {
    if target.is_zero() {
        return "0 (unsatisfiable)".to_string();
    }
    format!("~2^{}", target.bits() - 1)
}
