//! Binary codecs
//!
//! CBOR is the envelope format for scripts and Plutus data.

pub mod cbor;

pub use cbor::{decode_bytes, encode_bytes, CborError, Decoder, Encoder};
