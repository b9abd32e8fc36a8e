//! Untyped Plutus Core terms
//!
//! Variables use de Bruijn indices: index 1 refers to the innermost
//! enclosing lambda.

use crate::uplc::builtins::DefaultFunction;
use crate::uplc::data::PlutusData;
use num_bigint::BigInt;
use std::rc::Rc;

// =============================================================================
// Program
// =============================================================================

/// Plutus Core language version carried in the program header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(pub u64, pub u64, pub u64);

impl Version {
    /// Version used by every script this crate produces
    pub const V1_0_0: Version = Version(1, 0, 0);
}

/// A versioned, closed term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub version: Version,
    pub term: Term,
}

impl Program {
    /// Wrap a term in a 1.0.0 program
    pub fn new(term: Term) -> Self {
        Self {
            version: Version::V1_0_0,
            term,
        }
    }

    /// Apply the program to data arguments (datum, redeemer, context ...)
    pub fn apply_data(&self, args: &[PlutusData]) -> Program {
        let term = args.iter().fold(self.term.clone(), |f, arg| {
            Term::apply(f, Term::constant(Constant::Data(arg.clone())))
        });
        Program {
            version: self.version,
            term,
        }
    }
}

// =============================================================================
// Terms
// =============================================================================

/// A term of untyped Plutus Core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Variable by de Bruijn index (1-based)
    Var(usize),
    Delay(Rc<Term>),
    /// Lambda abstraction; the binder is implied by position
    Lambda(Rc<Term>),
    Apply(Rc<Term>, Rc<Term>),
    Constant(Rc<Constant>),
    Force(Rc<Term>),
    Error,
    Builtin(DefaultFunction),
}

impl Term {
    pub fn var(index: usize) -> Self {
        Term::Var(index)
    }

    pub fn lambda(body: Term) -> Self {
        Term::Lambda(Rc::new(body))
    }

    pub fn apply(function: Term, argument: Term) -> Self {
        Term::Apply(Rc::new(function), Rc::new(argument))
    }

    /// Apply `function` to each argument in turn
    pub fn apply_all(function: Term, args: impl IntoIterator<Item = Term>) -> Self {
        args.into_iter().fold(function, Term::apply)
    }

    pub fn delay(body: Term) -> Self {
        Term::Delay(Rc::new(body))
    }

    pub fn force(body: Term) -> Self {
        Term::Force(Rc::new(body))
    }

    pub fn constant(value: Constant) -> Self {
        Term::Constant(Rc::new(value))
    }

    pub fn unit() -> Self {
        Term::constant(Constant::Unit)
    }

    pub fn bool(value: bool) -> Self {
        Term::constant(Constant::Bool(value))
    }

    /// A builtin with all its type instantiations already forced
    pub fn builtin(fun: DefaultFunction) -> Self {
        (0..fun.force_count()).fold(Term::Builtin(fun), |t, _| Term::force(t))
    }

    /// Saturated builtin application
    pub fn call(fun: DefaultFunction, args: impl IntoIterator<Item = Term>) -> Self {
        Term::apply_all(Term::builtin(fun), args)
    }

    /// Strict-condition, lazy-branch `if`: `force (ifThenElse c (delay t) (delay e))`
    pub fn if_then_else(condition: Term, then: Term, otherwise: Term) -> Self {
        Term::force(Term::call(
            DefaultFunction::IfThenElse,
            [condition, Term::delay(then), Term::delay(otherwise)],
        ))
    }

    /// Number of nodes in the term tree
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(term) = stack.pop() {
            count += 1;
            match term {
                Term::Delay(t) | Term::Lambda(t) | Term::Force(t) => stack.push(t),
                Term::Apply(f, a) => {
                    stack.push(a);
                    stack.push(f);
                }
                _ => {}
            }
        }
        count
    }

    /// Whether every variable is bound by an enclosing lambda
    pub fn is_closed(&self) -> bool {
        let mut stack = vec![(self, 0usize)];
        while let Some((term, depth)) = stack.pop() {
            match term {
                Term::Var(i) if *i < 1 || *i > depth => return false,
                Term::Lambda(body) => stack.push((body, depth + 1)),
                Term::Delay(t) | Term::Force(t) => stack.push((t, depth)),
                Term::Apply(f, a) => {
                    stack.push((a, depth));
                    stack.push((f, depth));
                }
                _ => {}
            }
        }
        true
    }
}

// =============================================================================
// Constants
// =============================================================================

/// Types of built-in constants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantType {
    Integer,
    ByteString,
    String,
    Unit,
    Bool,
    List(Box<ConstantType>),
    Pair(Box<ConstantType>, Box<ConstantType>),
    Data,
}

/// A built-in constant value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Integer(BigInt),
    ByteString(Vec<u8>),
    String(String),
    Unit,
    Bool(bool),
    /// Homogeneous list with its element type
    ProtoList(ConstantType, Vec<Constant>),
    /// Pair with both component types
    ProtoPair(ConstantType, ConstantType, Box<Constant>, Box<Constant>),
    Data(PlutusData),
}

impl Constant {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Constant::Integer(value.into())
    }

    /// The type of this constant
    pub fn type_of(&self) -> ConstantType {
        match self {
            Constant::Integer(_) => ConstantType::Integer,
            Constant::ByteString(_) => ConstantType::ByteString,
            Constant::String(_) => ConstantType::String,
            Constant::Unit => ConstantType::Unit,
            Constant::Bool(_) => ConstantType::Bool,
            Constant::ProtoList(elem, _) => ConstantType::List(Box::new(elem.clone())),
            Constant::ProtoPair(a, b, _, _) => {
                ConstantType::Pair(Box::new(a.clone()), Box::new(b.clone()))
            }
            Constant::Data(_) => ConstantType::Data,
        }
    }

    /// A `list data` constant
    pub fn data_list(items: Vec<PlutusData>) -> Self {
        Constant::ProtoList(
            ConstantType::Data,
            items.into_iter().map(Constant::Data).collect(),
        )
    }

    /// A `pair data data` constant
    pub fn data_pair(a: PlutusData, b: PlutusData) -> Self {
        Constant::ProtoPair(
            ConstantType::Data,
            ConstantType::Data,
            Box::new(Constant::Data(a)),
            Box::new(Constant::Data(b)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_inserts_forces() {
        let t = Term::builtin(DefaultFunction::SndPair);
        assert_eq!(
            t,
            Term::force(Term::force(Term::Builtin(DefaultFunction::SndPair)))
        );
        assert_eq!(
            Term::builtin(DefaultFunction::EqualsData),
            Term::Builtin(DefaultFunction::EqualsData)
        );
    }

    #[test]
    fn test_closedness() {
        let id = Term::lambda(Term::var(1));
        assert!(id.is_closed());
        assert!(!Term::lambda(Term::var(2)).is_closed());
        assert!(!Term::var(0).is_closed());
    }

    #[test]
    fn test_size_of_deep_term() {
        let deep = (0..5_000).fold(Term::lambda(Term::var(1)), |t, _| Term::delay(t));
        assert_eq!(deep.size(), 5_002);
        assert!(deep.is_closed());
    }

    #[test]
    fn test_apply_data() {
        let program = Program::new(Term::lambda(Term::unit()));
        let applied = program.apply_data(&[PlutusData::integer(1)]);
        assert_eq!(
            applied.term,
            Term::apply(
                Term::lambda(Term::unit()),
                Term::constant(Constant::Data(PlutusData::integer(1)))
            )
        );
    }

    #[test]
    fn test_constant_types() {
        let list = Constant::data_list(vec![PlutusData::integer(1)]);
        assert_eq!(
            list.type_of(),
            ConstantType::List(Box::new(ConstantType::Data))
        );
    }
}
