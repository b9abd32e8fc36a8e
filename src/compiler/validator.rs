//! Validator signatures

use crate::compiler::expr::Expr;
use crate::compiler::types::Type;
use std::fmt;

/// What a validator guards; fixes its calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Datum, redeemer, context
    Spending,
    /// Redeemer, context
    Minting,
}

impl Purpose {
    /// Number of positional arguments the ledger supplies
    pub fn arity(&self) -> usize {
        self.roles().len()
    }

    /// Names of the positional arguments, in order
    pub fn roles(&self) -> &'static [&'static str] {
        match self {
            Purpose::Spending => &["datum", "redeemer", "context"],
            Purpose::Minting => &["redeemer", "context"],
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::Spending => write!(f, "spending"),
            Purpose::Minting => write!(f, "minting"),
        }
    }
}

/// Typed positional parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

pub fn param(name: &str, ty: Type) -> Param {
    Param {
        name: name.to_string(),
        ty,
    }
}

/// A validator: parameters, declared result and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorFunction {
    pub purpose: Purpose,
    pub params: Vec<Param>,
    /// `Boolean` (success iff true) or `Unit` (success unless it errors)
    pub result: Type,
    pub body: Expr,
}

impl ValidatorFunction {
    pub fn spending(params: Vec<Param>, result: Type, body: Expr) -> Self {
        Self {
            purpose: Purpose::Spending,
            params,
            result,
            body,
        }
    }

    pub fn minting(params: Vec<Param>, result: Type, body: Expr) -> Self {
        Self {
            purpose: Purpose::Minting,
            params,
            result,
            body,
        }
    }
}
