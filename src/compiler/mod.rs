//! Validator compiler
//!
//! Lowers small, typed validator expressions to Untyped Plutus Core.
//!
//! # Example
//!
//! ```rust
//! use mini_plutus::compiler::{compile, expr::make_unit, param, Type, ValidatorFunction};
//!
//! let validator = ValidatorFunction::spending(
//!     vec![
//!         param("datum", Type::Data),
//!         param("redeemer", Type::Data),
//!         param("ctx", Type::Data),
//!     ],
//!     Type::Unit,
//!     make_unit(),
//! );
//! let compiled = compile(&validator).unwrap();
//! assert_eq!(hex::encode(compiled.flat_bytes()), "010000222499");
//! ```

pub mod error;
pub mod expr;
pub mod lower;
pub mod program;
pub mod types;
pub mod validator;

pub use error::CompileError;
pub use expr::{Expr, Literal, Predicate};
pub use lower::{compile, Compiler};
pub use program::CompiledProgram;
pub use types::{Field, RecordType, Type};
pub use validator::{param, Param, Purpose, ValidatorFunction};
