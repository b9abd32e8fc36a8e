//! Mini-Plutus: tiny Plutus validators compiled to Untyped Plutus Core
//!
//! This crate provides a small validator toolchain featuring:
//! - A typed combinator language for validator bodies
//! - Lowering to Untyped Plutus Core with de Bruijn indices
//! - The flat program codec and CBOR Plutus data
//! - Versioned script envelopes (`.plutus` JSON, script hashes, addresses)
//! - A CEK machine with budget accounting for local evaluation
//! - Script context construction for Plutus V1/V2
//!
//! # Example
//!
//! ```rust
//! use mini_plutus::compiler::compile;
//! use mini_plutus::script::{wrap, ScriptType};
//! use mini_plutus::validators;
//!
//! // Compile the always-succeeds validator
//! let compiled = compile(&validators::always_succeeds()).unwrap();
//!
//! // Wrap it for Plutus V2
//! let envelope = wrap(compiled, ScriptType::PlutusV2);
//! assert_eq!(envelope.to_cbor_hex(), "4746010000222499");
//!
//! let json = envelope.to_json().unwrap();
//! println!("{}", json);
//! ```

pub mod bench;
pub mod cli;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod script;
pub mod uplc;
pub mod validators;

// Re-export commonly used types
pub use compiler::{compile, CompileError, CompiledProgram, Type, ValidatorFunction};
pub use config::BuildConfig;
pub use ledger::{ContextBuilder, Network, PubKeyHash};
pub use script::{wrap, ScriptEnvelope, ScriptError, ScriptType};
pub use uplc::{PlutusData, Program, Term};
