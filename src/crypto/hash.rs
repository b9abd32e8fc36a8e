//! Cryptographic hashing utilities
//!
//! Provides the digests used for script hashes, key hashes and the hashing
//! builtins of the evaluator.

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};
use sha2::Sha256;

/// Size of a script or public-key hash in bytes
pub const HASH_224_SIZE: usize = 28;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes BLAKE2b-256 hash of the input data
/// Used for transaction ids and datum hashes
pub fn blake2b_256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes BLAKE2b-224 hash of the input data
/// Used for script hashes and verification key hashes
pub fn blake2b_224(data: &[u8]) -> [u8; HASH_224_SIZE] {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(data);
    let mut out = [0u8; HASH_224_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Computes BLAKE2b-224 hash and returns it as a hex string
pub fn blake2b_224_hex(data: &[u8]) -> String {
    hex::encode(blake2b_224(data))
}
