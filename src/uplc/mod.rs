//! Untyped Plutus Core
//!
//! The low-level target of the validator compiler.
//!
//! # Overview
//!
//! This module implements:
//! - The term model and builtin function table
//! - The flat binary codec used on chain
//! - Plutus data with its CBOR encoding
//! - A CEK machine with budget metering for local evaluation
//!
//! # Example
//!
//! ```rust
//! use mini_plutus::uplc::{flat, machine, Program, Term};
//!
//! let program = Program::new(Term::lambda(Term::unit()));
//! let bytes = flat::encode_program(&program);
//! assert_eq!(flat::decode_program(&bytes).unwrap(), program);
//!
//! let result = machine::eval(&Program::new(Term::unit()));
//! assert!(result.is_success());
//! ```

pub mod builtins;
pub mod data;
pub mod flat;
pub mod machine;
pub mod pretty;
pub mod runtime;
pub mod term;

pub use builtins::DefaultFunction;
pub use data::PlutusData;
pub use flat::{decode_program, encode_program, FlatError};
pub use machine::{eval, EvalResult, ExBudget, Machine, MachineError};
pub use pretty::disassemble;
pub use term::{Constant, ConstantType, Program, Term, Version};
