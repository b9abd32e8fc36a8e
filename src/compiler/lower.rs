//! Lowering from validator expressions to UPLC
//!
//! A single structural pass: each node lowers to a `(Term, Type)` pair,
//! names resolve to de Bruijn indices through an explicit scope stack, and
//! the first error aborts the whole compilation.

use crate::compiler::error::CompileError;
use crate::compiler::expr::{Expr, Literal, Predicate};
use crate::compiler::program::CompiledProgram;
use crate::compiler::types::Type;
use crate::compiler::validator::ValidatorFunction;
use crate::uplc::builtins::DefaultFunction;
use crate::uplc::term::{Constant, Program, Term};

/// Combinators applied through `Expr::Apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    MakeUnit,
    And,
    Or,
    Not,
    Require,
}

impl Combinator {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "makeUnit" => Some(Combinator::MakeUnit),
            "and" => Some(Combinator::And),
            "or" => Some(Combinator::Or),
            "not" => Some(Combinator::Not),
            "require" => Some(Combinator::Require),
            _ => None,
        }
    }

    fn arity(&self) -> usize {
        match self {
            Combinator::MakeUnit => 0,
            Combinator::Not | Combinator::Require => 1,
            Combinator::And | Combinator::Or => 2,
        }
    }
}

/// How a bound value is represented at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    /// Plutus data, decoded at each use
    Data,
    /// Already decoded to its declared type
    Native,
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    ty: Type,
    repr: Repr,
}

/// Validator compiler
pub struct Compiler {
    /// Bound names, innermost last
    scope: Vec<Binding>,
    /// Location of the node being lowered
    path: Vec<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            scope: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Compile a validator to a program
    pub fn compile(&mut self, validator: &ValidatorFunction) -> Result<CompiledProgram, CompileError> {
        self.scope.clear();
        self.path.clear();

        self.check_signature(validator)?;

        for p in &validator.params {
            self.scope.push(Binding {
                name: p.name.clone(),
                ty: p.ty.clone(),
                repr: Repr::Data,
            });
        }

        let (body, ty) = self.at("body".to_string(), |c| c.lower(&validator.body))?;
        if ty != validator.result {
            return Err(CompileError::TypeError {
                location: "body".to_string(),
                message: format!(
                    "validator declares result {} but its body has type {}",
                    validator.result, ty
                ),
            });
        }

        let body = match validator.result {
            Type::Boolean => require_term(body),
            _ => body,
        };
        let term = validator.params.iter().fold(body, |t, _| Term::lambda(t));
        self.scope.clear();

        let compiled = CompiledProgram::new(Program::new(term));
        log::debug!(
            "Compiled {} validator: {} terms, {} bytes",
            validator.purpose,
            compiled.program().term.size(),
            compiled.size()
        );
        Ok(compiled)
    }

    fn check_signature(&self, validator: &ValidatorFunction) -> Result<(), CompileError> {
        let signature_error = |message: String| CompileError::TypeError {
            location: "signature".to_string(),
            message,
        };

        let expected = validator.purpose.arity();
        if validator.params.len() != expected {
            return Err(signature_error(format!(
                "{} validators take {} parameters ({}), found {}",
                validator.purpose,
                expected,
                validator.purpose.roles().join(", "),
                validator.params.len()
            )));
        }

        for (i, p) in validator.params.iter().enumerate() {
            if validator.params[..i].iter().any(|q| q.name == p.name) {
                return Err(signature_error(format!("duplicate parameter '{}'", p.name)));
            }
        }

        match validator.result {
            Type::Boolean | Type::Unit => Ok(()),
            ref other => Err(signature_error(format!(
                "validators return Boolean or Unit, not {}",
                other
            ))),
        }
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Run `f` with `segment` appended to the current location
    fn at<T>(
        &mut self,
        segment: String,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    fn location(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join("/")
        }
    }

    fn type_error(&self, message: String) -> CompileError {
        CompileError::TypeError {
            location: self.location(),
            message,
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn lower(&mut self, expr: &Expr) -> Result<(Term, Type), CompileError> {
        match expr {
            Expr::Literal(lit) => Ok((lower_literal(lit), lit.ty())),
            Expr::Var(name) => self.lower_var(name),
            Expr::Extract {
                record,
                field,
                body,
            } => self.at(format!("extract({})", field), |c| {
                c.lower_extract(record, field, body)
            }),
            Expr::Predicate(Predicate::Equals(lhs, rhs)) => {
                self.at("equals".to_string(), |c| c.lower_equals(lhs, rhs))
            }
            Expr::Predicate(Predicate::Exists {
                collection,
                binder,
                body,
            }) => self.at("exists".to_string(), |c| {
                c.lower_exists(collection, binder, body)
            }),
            Expr::Apply { combinator, args } => self.lower_apply(combinator, args),
        }
    }

    fn lower_var(&self, name: &str) -> Result<(Term, Type), CompileError> {
        let position = self
            .scope
            .iter()
            .rposition(|b| b.name == name)
            .ok_or_else(|| CompileError::UnresolvedReference {
                location: self.location(),
                name: name.to_string(),
            })?;

        let binding = &self.scope[position];
        let term = Term::var(self.scope.len() - position);
        let term = match binding.repr {
            Repr::Data => from_data(&binding.ty, term),
            Repr::Native => term,
        };
        Ok((term, binding.ty.clone()))
    }

    fn lower_extract(
        &mut self,
        record: &Expr,
        field: &str,
        body: &Expr,
    ) -> Result<(Term, Type), CompileError> {
        let (record_term, record_ty) = self.at("record".to_string(), |c| c.lower(record))?;

        let record_type = match record_ty {
            Type::Record(r) => r,
            other => {
                return Err(self.type_error(format!(
                    "cannot extract field '{}' from a value of type {}",
                    field, other
                )))
            }
        };
        let (index, declared) = record_type.field(field).ok_or_else(|| {
            self.type_error(format!(
                "record {} has no field '{}'",
                record_type.name, field
            ))
        })?;
        let field_ty = declared.ty.clone();
        let projection = from_data(&field_ty, field_access(record_term, index));

        self.scope.push(Binding {
            name: field.to_string(),
            ty: field_ty,
            repr: Repr::Native,
        });
        let body = self.at("in".to_string(), |c| c.lower(body));
        self.scope.pop();
        let (body_term, body_ty) = body?;

        Ok((Term::apply(Term::lambda(body_term), projection), body_ty))
    }

    fn lower_equals(&mut self, lhs: &Expr, rhs: &Expr) -> Result<(Term, Type), CompileError> {
        let (a, a_ty) = self.at("lhs".to_string(), |c| c.lower(lhs))?;
        let (b, b_ty) = self.at("rhs".to_string(), |c| c.lower(rhs))?;

        if a_ty != b_ty {
            return Err(self.type_error(format!(
                "equals expects operands of the same type, found {} and {}",
                a_ty, b_ty
            )));
        }

        let term = match a_ty {
            Type::Integer => Term::call(DefaultFunction::EqualsInteger, [a, b]),
            Type::ByteString | Type::PubKeyHash => {
                Term::call(DefaultFunction::EqualsByteString, [a, b])
            }
            Type::Data | Type::Record(_) => Term::call(DefaultFunction::EqualsData, [a, b]),
            Type::Boolean => {
                let not_b = not_term(b.clone());
                Term::call(DefaultFunction::IfThenElse, [a, b, not_b])
            }
            // Both sides still run so a failing `require` is not dropped
            Type::Unit => Term::call(
                DefaultFunction::ChooseUnit,
                [a, Term::call(DefaultFunction::ChooseUnit, [b, Term::bool(true)])],
            ),
            Type::List(_) => {
                return Err(self.type_error(format!("equality is not defined for {}", a_ty)))
            }
        };
        Ok((term, Type::Boolean))
    }

    fn lower_exists(
        &mut self,
        collection: &Expr,
        binder: &str,
        body: &Expr,
    ) -> Result<(Term, Type), CompileError> {
        let (list, list_ty) = self.at("collection".to_string(), |c| c.lower(collection))?;
        let element_ty = match list_ty {
            Type::List(elem) => *elem,
            other => {
                return Err(self.type_error(format!(
                    "exists expects a List, found {}",
                    other
                )))
            }
        };

        self.scope.push(Binding {
            name: binder.to_string(),
            ty: element_ty,
            repr: Repr::Data,
        });
        let predicate = self.at("predicate".to_string(), |c| c.lower(body));
        self.scope.pop();
        let (predicate, predicate_ty) = predicate?;

        if predicate_ty != Type::Boolean {
            return Err(self.type_error(format!(
                "exists predicate must be Boolean, found {}",
                predicate_ty
            )));
        }

        let term = Term::apply_all(exists_loop(), [Term::lambda(predicate), list]);
        Ok((term, Type::Boolean))
    }

    fn lower_apply(&mut self, name: &str, args: &[Expr]) -> Result<(Term, Type), CompileError> {
        let combinator =
            Combinator::from_name(name).ok_or_else(|| CompileError::UnsupportedCombinator {
                location: self.location(),
                name: name.to_string(),
            })?;

        self.at(name.to_string(), |c| {
            let mut operands = Vec::with_capacity(args.len());
            for (i, arg) in args.iter().enumerate() {
                let (term, ty) = c.at(format!("args[{}]", i), |c| c.lower(arg))?;
                if ty != Type::Boolean {
                    return Err(c.type_error(format!(
                        "argument {} of {} must be Boolean, found {}",
                        i, name, ty
                    )));
                }
                operands.push(term);
            }

            Ok(match (combinator, operands.as_slice()) {
                (Combinator::MakeUnit, []) => (Term::unit(), Type::Unit),
                (Combinator::And, [a, b]) => (
                    Term::if_then_else(a.clone(), b.clone(), Term::bool(false)),
                    Type::Boolean,
                ),
                (Combinator::Or, [a, b]) => (
                    Term::if_then_else(a.clone(), Term::bool(true), b.clone()),
                    Type::Boolean,
                ),
                (Combinator::Not, [a]) => (not_term(a.clone()), Type::Boolean),
                (Combinator::Require, [a]) => (require_term(a.clone()), Type::Unit),
                _ => {
                    return Err(c.type_error(format!(
                        "{} expects {} arguments, found {}",
                        name,
                        combinator.arity(),
                        operands.len()
                    )))
                }
            })
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a validator with a fresh compiler
pub fn compile(validator: &ValidatorFunction) -> Result<CompiledProgram, CompileError> {
    Compiler::new().compile(validator)
}

// =============================================================================
// Term shapes
// =============================================================================

fn lower_literal(lit: &Literal) -> Term {
    let constant = match lit {
        Literal::Unit => Constant::Unit,
        Literal::Boolean(b) => Constant::Bool(*b),
        Literal::Integer(i) => Constant::Integer(i.clone()),
        Literal::ByteString(b) => Constant::ByteString(b.clone()),
        Literal::PubKeyHash(pkh) => Constant::ByteString(pkh.as_bytes().to_vec()),
        Literal::Data(d) => Constant::Data(d.clone()),
    };
    Term::constant(constant)
}

/// Decode a data term into the native representation of `ty`
fn from_data(ty: &Type, term: Term) -> Term {
    match ty {
        Type::Data | Type::Record(_) => term,
        Type::Integer => Term::call(DefaultFunction::UnIData, [term]),
        Type::ByteString | Type::PubKeyHash => Term::call(DefaultFunction::UnBData, [term]),
        Type::List(_) => Term::call(DefaultFunction::UnListData, [term]),
        // False = Constr 0 [], True = Constr 1 []
        Type::Boolean => Term::call(
            DefaultFunction::EqualsInteger,
            [
                Term::call(
                    DefaultFunction::FstPair,
                    [Term::call(DefaultFunction::UnConstrData, [term])],
                ),
                Term::constant(Constant::integer(1)),
            ],
        ),
        Type::Unit => Term::unit(),
    }
}

/// `headList (tailList^index (sndPair (unConstrData record)))`
fn field_access(record: Term, index: usize) -> Term {
    let fields = Term::call(
        DefaultFunction::SndPair,
        [Term::call(DefaultFunction::UnConstrData, [record])],
    );
    let rest = (0..index).fold(fields, |t, _| Term::call(DefaultFunction::TailList, [t]));
    Term::call(DefaultFunction::HeadList, [rest])
}

fn not_term(b: Term) -> Term {
    Term::call(
        DefaultFunction::IfThenElse,
        [b, Term::bool(false), Term::bool(true)],
    )
}

fn require_term(condition: Term) -> Term {
    Term::if_then_else(condition, Term::unit(), Term::Error)
}

/// `\p -> (\g -> g g) (\self xs -> ...)`, applied to a predicate and a list
///
/// Inside the loop body `xs` is 1, `self` is 2 and `p` is 3.
fn exists_loop() -> Term {
    let xs = || Term::var(1);
    let this = || Term::var(2);
    let p = Term::var(3);

    let step = Term::if_then_else(
        Term::apply(p, Term::call(DefaultFunction::HeadList, [xs()])),
        Term::bool(true),
        Term::apply_all(
            this(),
            [this(), Term::call(DefaultFunction::TailList, [xs()])],
        ),
    );
    let body = Term::force(Term::call(
        DefaultFunction::ChooseList,
        [xs(), Term::delay(Term::bool(false)), Term::delay(step)],
    ));
    let self_apply = Term::lambda(Term::apply(Term::var(1), Term::var(1)));

    Term::lambda(Term::apply(self_apply, Term::lambda(Term::lambda(body))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::expr::*;
    use crate::compiler::validator::param;
    use crate::script::ScriptType;
    use crate::uplc::data::PlutusData;
    use crate::uplc::machine;

    fn always(params: Vec<(&str, Type)>) -> ValidatorFunction {
        ValidatorFunction::spending(
            params.into_iter().map(|(n, t)| param(n, t)).collect(),
            Type::Unit,
            make_unit(),
        )
    }

    fn run(compiled: &CompiledProgram, args: &[PlutusData]) -> bool {
        machine::eval(&compiled.program().apply_data(args)).is_success()
    }

    fn list_member(target: i64) -> ValidatorFunction {
        ValidatorFunction::spending(
            vec![
                param("xs", Type::list(Type::Integer)),
                param("redeemer", Type::Data),
                param("ctx", Type::Data),
            ],
            Type::Boolean,
            exists(var("xs"), "x", equals(var("x"), integer(target))),
        )
    }

    fn int_list(items: &[i64]) -> PlutusData {
        PlutusData::List(items.iter().map(|i| PlutusData::integer(*i)).collect())
    }

    #[test]
    fn test_always_succeeds_bytes() {
        let compiled = compile(&always(vec![
            ("datum", Type::Data),
            ("redeemer", Type::Data),
            ("ctx", Type::Data),
        ]))
        .unwrap();
        assert_eq!(hex::encode(compiled.flat_bytes()), "010000222499");
    }

    #[test]
    fn test_unit_body_ignores_parameter_names_and_types() {
        let a = compile(&always(vec![
            ("datum", Type::Data),
            ("redeemer", Type::Data),
            ("ctx", Type::Data),
        ]))
        .unwrap();
        let b = compile(&always(vec![
            ("owner", Type::PubKeyHash),
            ("n", Type::Integer),
            ("context", Type::script_context(ScriptType::PlutusV2)),
        ]))
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let validator = list_member(3);
        let mut compiler = Compiler::new();
        let first = compiler.compile(&validator).unwrap();
        let second = compiler.compile(&validator).unwrap();
        assert_eq!(first.flat_bytes(), second.flat_bytes());
    }

    #[test]
    fn test_exists_over_list_parameter() {
        let compiled = compile(&list_member(3)).unwrap();
        let unit = PlutusData::unit_constr(0);
        assert!(run(&compiled, &[int_list(&[1, 2, 3]), unit.clone(), unit.clone()]));
        assert!(run(&compiled, &[int_list(&[3]), unit.clone(), unit.clone()]));
        assert!(!run(&compiled, &[int_list(&[1, 2]), unit.clone(), unit.clone()]));
        assert!(!run(&compiled, &[int_list(&[]), unit.clone(), unit]));
    }

    #[test]
    fn test_boolean_parameter_and_combinators() {
        let validator = ValidatorFunction::minting(
            vec![param("flag", Type::Boolean), param("ctx", Type::Data)],
            Type::Boolean,
            or(
                and(var("flag"), not(boolean(false))),
                equals(integer(1), integer(2)),
            ),
        );
        let compiled = compile(&validator).unwrap();
        let ctx = PlutusData::unit_constr(0);
        assert!(run(&compiled, &[PlutusData::bool(true), ctx.clone()]));
        assert!(!run(&compiled, &[PlutusData::bool(false), ctx]));
    }

    #[test]
    fn test_require_in_unit_body() {
        let validator = ValidatorFunction::minting(
            vec![param("n", Type::Integer), param("ctx", Type::Data)],
            Type::Unit,
            require(equals(var("n"), integer(42))),
        );
        let compiled = compile(&validator).unwrap();
        let ctx = PlutusData::unit_constr(0);
        assert!(run(&compiled, &[PlutusData::integer(42), ctx.clone()]));
        assert!(!run(&compiled, &[PlutusData::integer(41), ctx]));
    }

    #[test]
    fn test_extract_binds_only_inside_scope() {
        let ctx_ty = Type::script_context(ScriptType::PlutusV2);
        let validator = ValidatorFunction::spending(
            vec![
                param("datum", Type::Data),
                param("redeemer", Type::Data),
                param("ctx", ctx_ty),
            ],
            Type::Boolean,
            and(
                extract_field(var("ctx"), "purpose", equals(var("purpose"), var("datum"))),
                equals(var("purpose"), var("datum")),
            ),
        );
        assert_eq!(
            compile(&validator),
            Err(CompileError::UnresolvedReference {
                location: "body/and/args[1]/equals/lhs".to_string(),
                name: "purpose".to_string(),
            })
        );
    }

    #[test]
    fn test_mismatched_equals_is_type_error() {
        let validator = ValidatorFunction::spending(
            vec![
                param("owner", Type::PubKeyHash),
                param("redeemer", Type::Data),
                param("ctx", Type::Data),
            ],
            Type::Boolean,
            equals(var("redeemer"), var("owner")),
        );
        match compile(&validator) {
            Err(CompileError::TypeError { location, .. }) => assert_eq!(location, "body/equals"),
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field() {
        let validator = ValidatorFunction::spending(
            vec![
                param("datum", Type::Data),
                param("redeemer", Type::Data),
                param("ctx", Type::script_context(ScriptType::PlutusV1)),
            ],
            Type::Unit,
            extract_field(var("ctx"), "scriptInfo", make_unit()),
        );
        let err = compile(&validator).unwrap_err();
        assert!(matches!(err, CompileError::TypeError { .. }));
        assert_eq!(err.location(), "body/extract(scriptInfo)");
    }

    #[test]
    fn test_extract_from_non_record() {
        let validator = ValidatorFunction::spending(
            vec![
                param("datum", Type::Data),
                param("redeemer", Type::Data),
                param("ctx", Type::Data),
            ],
            Type::Unit,
            extract_field(var("ctx"), "txInfo", make_unit()),
        );
        assert!(matches!(
            compile(&validator),
            Err(CompileError::TypeError { .. })
        ));
    }

    #[test]
    fn test_unsupported_combinator() {
        let validator = always(vec![
            ("datum", Type::Data),
            ("redeemer", Type::Data),
            ("ctx", Type::Data),
        ]);
        let validator = ValidatorFunction {
            body: apply("sum", vec![integer(1)]),
            ..validator
        };
        assert_eq!(
            compile(&validator),
            Err(CompileError::UnsupportedCombinator {
                location: "body".to_string(),
                name: "sum".to_string(),
            })
        );
    }

    #[test]
    fn test_spending_arity_enforced() {
        let validator = always(vec![("redeemer", Type::Data), ("ctx", Type::Data)]);
        let err = compile(&validator).unwrap_err();
        assert_eq!(err.location(), "signature");
    }

    #[test]
    fn test_result_type_must_match_body() {
        let validator = ValidatorFunction::minting(
            vec![param("redeemer", Type::Data), param("ctx", Type::Data)],
            Type::Unit,
            boolean(true),
        );
        let err = compile(&validator).unwrap_err();
        assert_eq!(err.location(), "body");
    }

    #[test]
    fn test_unit_equality_keeps_operands() {
        let unit_check = |condition: bool| {
            ValidatorFunction::minting(
                vec![param("redeemer", Type::Data), param("ctx", Type::Data)],
                Type::Boolean,
                equals(require(boolean(condition)), make_unit()),
            )
        };
        let args = [PlutusData::unit_constr(0), PlutusData::unit_constr(0)];
        assert!(run(&compile(&unit_check(true)).unwrap(), &args));
        assert!(!run(&compile(&unit_check(false)).unwrap(), &args));
    }

    #[test]
    fn test_list_equality_rejected() {
        let validator = ValidatorFunction::minting(
            vec![param("xs", Type::list(Type::Data)), param("ctx", Type::Data)],
            Type::Boolean,
            equals(var("xs"), var("xs")),
        );
        assert!(matches!(
            compile(&validator),
            Err(CompileError::TypeError { .. })
        ));
    }

    #[test]
    fn test_combinator_operand_types_checked() {
        let validator = ValidatorFunction::minting(
            vec![param("redeemer", Type::Data), param("ctx", Type::Data)],
            Type::Boolean,
            not(integer(1)),
        );
        let err = compile(&validator).unwrap_err();
        assert_eq!(err.location(), "body/not");
        assert!(matches!(err, CompileError::TypeError { .. }));
    }
}
