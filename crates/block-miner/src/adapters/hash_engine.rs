//! Stock proof-of-work hash engines

use crate::domain::BlockHeader;
use crate::ports::HashEngine;
use crate::utils::hashing::{blake3d, bytes_to_h256, sha256d};
use primitive_types::H256;

/// SHA-256d over the canonical header encoding
#[derive(Copy, Clone, Debug, Default)]
pub struct Sha256dEngine;

impl HashEngine for Sha256dEngine {
    #[inline]
    fn pow_hash(&self, header: &BlockHeader) -> H256 {
        bytes_to_h256(&sha256d(&header.serialize()))
    }
}

/// Double BLAKE3 over the canonical header encoding
#[derive(Copy, Clone, Debug, Default)]
pub struct Blake3dEngine;

impl HashEngine for Blake3dEngine {
    #[inline]
    fn pow_hash(&self, header: &BlockHeader) -> H256 {
        bytes_to_h256(&blake3d(&header.serialize()))
    }
}
