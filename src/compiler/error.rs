//! Compilation errors

use thiserror::Error;

/// Errors raised while lowering a validator
///
/// Every variant carries the location of the offending node as a path from
/// the validator root, e.g. `body/extract(txInfo)/in/exists/predicate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Type error at {location}: {message}")]
    TypeError { location: String, message: String },
    #[error("Unresolved reference '{name}' at {location}")]
    UnresolvedReference { location: String, name: String },
    #[error("Unsupported combinator '{name}' at {location}")]
    UnsupportedCombinator { location: String, name: String },
}

impl CompileError {
    /// Path of the node that failed
    pub fn location(&self) -> &str {
        match self {
            CompileError::TypeError { location, .. }
            | CompileError::UnresolvedReference { location, .. }
            | CompileError::UnsupportedCombinator { location, .. } => location,
        }
    }
}
