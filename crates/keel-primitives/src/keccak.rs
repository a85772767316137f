//! Keccak-256 hashing

use sha3::{Digest, Keccak256};

use crate::hash::H256;

/// Compute the keccak-256 digest of the input
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}
