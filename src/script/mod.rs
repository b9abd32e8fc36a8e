//! Script envelopes
//!
//! Wraps compiled programs for the ledger and moves them to and from
//! `.plutus` files.

pub mod envelope;
pub mod error;
pub mod file;

pub use envelope::{wrap, ScriptEnvelope, ScriptType, TextEnvelope};
pub use error::ScriptError;
pub use file::{load_script, save_script};
