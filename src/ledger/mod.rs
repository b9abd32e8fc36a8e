//! Ledger data
//!
//! Typed ledger values (key hashes, output references, addresses) and the
//! builder that assembles script contexts for local evaluation.

pub mod address;
pub mod context;
pub mod types;

pub use address::{payment_key_hash, script_address};
pub use context::{ContextBuilder, TxIn, TxOut};
pub use types::{ContextError, Credential, Network, PubKeyHash, TxOutRef};
