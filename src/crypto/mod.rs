//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 and BLAKE2b-256 digests for the evaluator builtins
//! - BLAKE2b-224 for script and key hashes

pub mod hash;

pub use hash::{blake2b_224, blake2b_224_hex, blake2b_256, sha256, HASH_224_SIZE};
