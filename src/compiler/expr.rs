//! Validator expression tree
//!
//! Trees are built with the constructor functions in this module:
//!
//! ```rust
//! use mini_plutus::compiler::expr::{equals, exists, extract_field, var};
//!
//! let body = extract_field(
//!     var("ctx"),
//!     "txInfo",
//!     extract_field(
//!         var("txInfo"),
//!         "signatories",
//!         exists(var("signatories"), "s", equals(var("s"), var("owner"))),
//!     ),
//! );
//! # let _ = body;
//! ```

use crate::compiler::types::Type;
use crate::ledger::PubKeyHash;
use crate::uplc::data::PlutusData;
use num_bigint::BigInt;

// =============================================================================
// Nodes
// =============================================================================

/// Literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Unit,
    Boolean(bool),
    Integer(BigInt),
    ByteString(Vec<u8>),
    PubKeyHash(PubKeyHash),
    Data(PlutusData),
}

impl Literal {
    /// Static type of the literal
    pub fn ty(&self) -> Type {
        match self {
            Literal::Unit => Type::Unit,
            Literal::Boolean(_) => Type::Boolean,
            Literal::Integer(_) => Type::Integer,
            Literal::ByteString(_) => Type::ByteString,
            Literal::PubKeyHash(_) => Type::PubKeyHash,
            Literal::Data(_) => Type::Data,
        }
    }
}

/// Built-in predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Structural equality of two values of the same type
    Equals(Box<Expr>, Box<Expr>),
    /// Some element of `collection`, bound to `binder`, satisfies `body`
    Exists {
        collection: Box<Expr>,
        binder: String,
        body: Box<Expr>,
    },
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    /// Reference to a parameter or a bound name
    Var(String),
    /// Project `field` from `record` and bind it by name inside `body`
    Extract {
        record: Box<Expr>,
        field: String,
        body: Box<Expr>,
    },
    Predicate(Predicate),
    /// Named combinator applied to arguments
    Apply { combinator: String, args: Vec<Expr> },
}

// =============================================================================
// Constructors
// =============================================================================

pub fn var(name: &str) -> Expr {
    Expr::Var(name.to_string())
}

pub fn unit() -> Expr {
    Expr::Literal(Literal::Unit)
}

pub fn boolean(value: bool) -> Expr {
    Expr::Literal(Literal::Boolean(value))
}

pub fn integer(value: impl Into<BigInt>) -> Expr {
    Expr::Literal(Literal::Integer(value.into()))
}

pub fn bytes(value: &[u8]) -> Expr {
    Expr::Literal(Literal::ByteString(value.to_vec()))
}

pub fn pub_key_hash(value: PubKeyHash) -> Expr {
    Expr::Literal(Literal::PubKeyHash(value))
}

pub fn data(value: PlutusData) -> Expr {
    Expr::Literal(Literal::Data(value))
}

/// `combinator(args...)`
pub fn apply(combinator: &str, args: Vec<Expr>) -> Expr {
    Expr::Apply {
        combinator: combinator.to_string(),
        args,
    }
}

/// The unit value; the body of an always-succeeding validator
pub fn make_unit() -> Expr {
    apply("makeUnit", Vec::new())
}

/// `record.field` bound as `field` inside `body`
pub fn extract_field(record: Expr, field: &str, body: Expr) -> Expr {
    Expr::Extract {
        record: Box::new(record),
        field: field.to_string(),
        body: Box::new(body),
    }
}

pub fn equals(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Predicate(Predicate::Equals(Box::new(lhs), Box::new(rhs)))
}

/// True iff some element of `collection`, bound as `binder`, satisfies `body`
pub fn exists(collection: Expr, binder: &str, body: Expr) -> Expr {
    Expr::Predicate(Predicate::Exists {
        collection: Box::new(collection),
        binder: binder.to_string(),
        body: Box::new(body),
    })
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    apply("and", vec![lhs, rhs])
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    apply("or", vec![lhs, rhs])
}

pub fn not(operand: Expr) -> Expr {
    apply("not", vec![operand])
}

/// Unit when `condition` holds, evaluation failure otherwise
pub fn require(condition: Expr) -> Expr {
    apply("require", vec![condition])
}

impl Expr {
    /// Builder form of [`extract_field`]: `ctx.extract("txInfo").within(body)`
    pub fn extract(self, field: &str) -> Extraction {
        Extraction {
            record: self,
            field: field.to_string(),
        }
    }
}

/// Pending field extraction awaiting its scope
#[derive(Debug, Clone)]
pub struct Extraction {
    record: Expr,
    field: String,
}

impl Extraction {
    pub fn within(self, body: Expr) -> Expr {
        extract_field(self.record, &self.field, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_matches_constructor() {
        let built = var("ctx").extract("txInfo").within(make_unit());
        assert_eq!(built, extract_field(var("ctx"), "txInfo", make_unit()));
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(Literal::Integer(1.into()).ty(), Type::Integer);
        assert_eq!(Literal::PubKeyHash(PubKeyHash::new([0; 28])).ty(), Type::PubKeyHash);
    }
}
