//! CEK machine for untyped Plutus Core
//!
//! Evaluates a program with an explicit continuation stack instead of host
//! recursion. Every machine step and every saturated builtin call is charged
//! against an execution budget, the way the ledger meters scripts:
//! - fixed per-step cost (cpu and memory)
//! - fixed per-builtin cost
//! - budget exhaustion aborts evaluation

use crate::uplc::builtins::DefaultFunction;
use crate::uplc::runtime;
use crate::uplc::term::{Constant, Program, Term};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

// =============================================================================
// Budget
// =============================================================================

/// Execution units: cpu steps and memory units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExBudget {
    pub cpu: i64,
    pub mem: i64,
}

impl ExBudget {
    pub const fn new(cpu: i64, mem: i64) -> Self {
        Self { cpu, mem }
    }

    /// Mainnet per-transaction script limits
    pub const fn max_tx() -> Self {
        Self::new(10_000_000_000, 14_000_000)
    }

    fn exhausted(&self) -> bool {
        self.cpu < 0 || self.mem < 0
    }
}

impl std::ops::Sub for ExBudget {
    type Output = ExBudget;

    fn sub(self, rhs: ExBudget) -> ExBudget {
        ExBudget::new(self.cpu - rhs.cpu, self.mem - rhs.mem)
    }
}

/// Flat costs charged by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModel {
    /// Charged once before evaluation starts
    pub startup: ExBudget,
    /// Charged for every compute step
    pub step: ExBudget,
    /// Charged for every saturated builtin call
    pub builtin: ExBudget,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            startup: ExBudget::new(100, 100),
            step: ExBudget::new(23_000, 100),
            builtin: ExBudget::new(150_000, 32),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Evaluation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("Evaluation failure: the script raised an error")]
    EvaluationFailure,
    #[error("Out of budget (remaining cpu {cpu}, mem {mem})")]
    OutOfBudget { cpu: i64, mem: i64 },
    #[error("Open term: variable {0} is unbound")]
    OpenTerm(usize),
    #[error("Attempted to apply a non-function")]
    NonFunctionalApplication,
    #[error("Attempted to force a non-polymorphic value")]
    NonPolymorphicInstantiation,
    #[error("Builtin {0} applied before being forced")]
    BuiltinTermArgumentExpected(DefaultFunction),
    #[error("Builtin {fun} expected {expected} argument")]
    TypeMismatch {
        fun: DefaultFunction,
        expected: &'static str,
    },
    #[error("Builtin {0} applied to an empty list")]
    EmptyList(DefaultFunction),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow")]
    IntegerOverflow,
    #[error("Index {0} out of range")]
    IndexOutOfRange(BigInt),
    #[error("Invalid UTF-8 in decodeUtf8")]
    InvalidUtf8,
    #[error("Builtin {0} is not implemented by this machine")]
    UnimplementedBuiltin(DefaultFunction),
}

// =============================================================================
// Values and environments
// =============================================================================

/// A machine value
#[derive(Debug, Clone)]
pub enum Value {
    Con(Rc<Constant>),
    Delay(Rc<Term>, Env),
    Lambda(Rc<Term>, Env),
    /// Partially applied builtin
    Builtin {
        fun: DefaultFunction,
        forces: usize,
        args: Vec<Value>,
    },
}

impl Value {
    pub fn con(constant: Constant) -> Self {
        Value::Con(Rc::new(constant))
    }
}

/// Persistent environment; index 1 is the most recent binding
#[derive(Debug, Clone, Default)]
pub struct Env(Option<Rc<EnvNode>>);

#[derive(Debug)]
struct EnvNode {
    value: Value,
    next: Env,
}

impl Env {
    fn extend(&self, value: Value) -> Env {
        Env(Some(Rc::new(EnvNode {
            value,
            next: self.clone(),
        })))
    }

    fn lookup(&self, index: usize) -> Option<&Value> {
        if index == 0 {
            return None;
        }
        let mut node = self.0.as_ref()?;
        for _ in 1..index {
            node = node.next.0.as_ref()?;
        }
        Some(&node.value)
    }
}

/// Continuation frames
#[derive(Debug)]
enum Frame {
    Force,
    /// Function under evaluation; argument still to compute
    ApplyTo(Env, Rc<Term>),
    /// Argument under evaluation; function already known
    ApplyFun(Value),
}

enum State {
    Compute(Env, Rc<Term>),
    Return(Value),
}

// =============================================================================
// Machine
// =============================================================================

/// Result of running a program
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Final term, or the error that stopped evaluation
    pub outcome: Result<Term, MachineError>,
    /// Budget consumed
    pub consumed: ExBudget,
    /// Messages emitted by `trace`
    pub logs: Vec<String>,
}

impl EvalResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The CEK machine
pub struct Machine {
    costs: CostModel,
    initial: ExBudget,
    remaining: ExBudget,
    frames: Vec<Frame>,
    logs: Vec<String>,
}

impl Machine {
    /// Create a machine with the given budget and default costs
    pub fn new(budget: ExBudget) -> Self {
        Self::with_costs(budget, CostModel::default())
    }

    pub fn with_costs(budget: ExBudget, costs: CostModel) -> Self {
        Self {
            costs,
            initial: budget,
            remaining: budget,
            frames: Vec::with_capacity(64),
            logs: Vec::new(),
        }
    }

    /// Evaluate a program to completion
    pub fn evaluate(mut self, program: &Program) -> EvalResult {
        let outcome = self.run(&program.term).map(|v| discharge(&v));
        let consumed = self.initial - self.remaining;
        match &outcome {
            Ok(term) => log::debug!(
                "Evaluation finished: {} (cpu {}, mem {})",
                term,
                consumed.cpu,
                consumed.mem
            ),
            Err(e) => log::debug!("Evaluation failed: {}", e),
        }
        EvalResult {
            outcome,
            consumed,
            logs: self.logs,
        }
    }

    fn spend(&mut self, cost: ExBudget) -> Result<(), MachineError> {
        self.remaining = self.remaining - cost;
        if self.remaining.exhausted() {
            return Err(MachineError::OutOfBudget {
                cpu: self.remaining.cpu,
                mem: self.remaining.mem,
            });
        }
        Ok(())
    }

    fn run(&mut self, term: &Term) -> Result<Value, MachineError> {
        self.spend(self.costs.startup)?;
        let mut state = State::Compute(Env::default(), Rc::new(term.clone()));
        loop {
            state = match state {
                State::Compute(env, term) => self.compute(env, &term)?,
                State::Return(value) => match self.frames.pop() {
                    None => return Ok(value),
                    Some(frame) => self.return_to(frame, value)?,
                },
            };
        }
    }

    fn compute(&mut self, env: Env, term: &Rc<Term>) -> Result<State, MachineError> {
        self.spend(self.costs.step)?;
        Ok(match term.as_ref() {
            Term::Var(index) => State::Return(
                env.lookup(*index)
                    .cloned()
                    .ok_or(MachineError::OpenTerm(*index))?,
            ),
            Term::Delay(body) => State::Return(Value::Delay(body.clone(), env)),
            Term::Lambda(body) => State::Return(Value::Lambda(body.clone(), env)),
            Term::Apply(function, argument) => {
                self.frames.push(Frame::ApplyTo(env.clone(), argument.clone()));
                State::Compute(env, function.clone())
            }
            Term::Constant(c) => State::Return(Value::Con(c.clone())),
            Term::Force(body) => {
                self.frames.push(Frame::Force);
                State::Compute(env, body.clone())
            }
            Term::Error => return Err(MachineError::EvaluationFailure),
            Term::Builtin(fun) => State::Return(Value::Builtin {
                fun: *fun,
                forces: 0,
                args: Vec::new(),
            }),
        })
    }

    fn return_to(&mut self, frame: Frame, value: Value) -> Result<State, MachineError> {
        match frame {
            Frame::Force => self.force(value),
            Frame::ApplyTo(env, argument) => {
                self.frames.push(Frame::ApplyFun(value));
                Ok(State::Compute(env, argument))
            }
            Frame::ApplyFun(function) => self.apply(function, value),
        }
    }

    fn force(&mut self, value: Value) -> Result<State, MachineError> {
        match value {
            Value::Delay(body, env) => Ok(State::Compute(env, body)),
            Value::Builtin { fun, forces, args }
                if forces < fun.force_count() && args.is_empty() =>
            {
                Ok(State::Return(Value::Builtin {
                    fun,
                    forces: forces + 1,
                    args,
                }))
            }
            _ => Err(MachineError::NonPolymorphicInstantiation),
        }
    }

    fn apply(&mut self, function: Value, argument: Value) -> Result<State, MachineError> {
        match function {
            Value::Lambda(body, env) => Ok(State::Compute(env.extend(argument), body)),
            Value::Builtin {
                fun,
                forces,
                mut args,
            } => {
                if forces < fun.force_count() {
                    return Err(MachineError::BuiltinTermArgumentExpected(fun));
                }
                args.push(argument);
                if args.len() < fun.arity() {
                    return Ok(State::Return(Value::Builtin { fun, forces, args }));
                }
                self.spend(self.costs.builtin)?;
                let result = runtime::call(fun, args, &mut self.logs)?;
                Ok(State::Return(result))
            }
            _ => Err(MachineError::NonFunctionalApplication),
        }
    }
}

/// Evaluate with the mainnet transaction budget
pub fn eval(program: &Program) -> EvalResult {
    Machine::new(ExBudget::max_tx()).evaluate(program)
}

// =============================================================================
// Discharge
// =============================================================================

/// Turn a value back into a closed term
pub fn discharge(value: &Value) -> Term {
    match value {
        Value::Con(c) => Term::Constant(c.clone()),
        Value::Delay(body, env) => Term::delay(substitute(body, env, 0)),
        Value::Lambda(body, env) => Term::lambda(substitute(body, env, 1)),
        Value::Builtin { fun, forces, args } => {
            let head = (0..*forces).fold(Term::Builtin(*fun), |t, _| Term::force(t));
            Term::apply_all(head, args.iter().map(discharge))
        }
    }
}

fn substitute(term: &Term, env: &Env, depth: usize) -> Term {
    match term {
        Term::Var(i) if *i > depth => match env.lookup(*i - depth) {
            Some(v) => discharge(v),
            None => term.clone(),
        },
        Term::Delay(body) => Term::delay(substitute(body, env, depth)),
        Term::Lambda(body) => Term::lambda(substitute(body, env, depth + 1)),
        Term::Force(body) => Term::force(substitute(body, env, depth)),
        Term::Apply(f, a) => Term::apply(substitute(f, env, depth), substitute(a, env, depth)),
        _ => term.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uplc::data::PlutusData;

    fn int(i: i64) -> Term {
        Term::constant(Constant::integer(i))
    }

    #[test]
    fn test_identity_application() {
        let program = Program::new(Term::apply(Term::lambda(Term::var(1)), int(7)));
        let result = eval(&program);
        assert_eq!(result.outcome, Ok(int(7)));
        assert!(result.consumed.cpu > 0);
    }

    #[test]
    fn test_builtin_addition() {
        let program = Program::new(Term::call(DefaultFunction::AddInteger, [int(10), int(20)]));
        assert_eq!(eval(&program).outcome, Ok(int(30)));
    }

    #[test]
    fn test_if_then_else_is_lazy() {
        let program = Program::new(Term::if_then_else(Term::bool(true), int(1), Term::Error));
        assert_eq!(eval(&program).outcome, Ok(int(1)));
    }

    #[test]
    fn test_error_term_fails() {
        let result = eval(&Program::new(Term::Error));
        assert_eq!(result.outcome, Err(MachineError::EvaluationFailure));
    }

    #[test]
    fn test_unforced_builtin_rejected() {
        let program = Program::new(Term::apply(
            Term::Builtin(DefaultFunction::HeadList),
            Term::constant(Constant::data_list(vec![])),
        ));
        assert_eq!(
            eval(&program).outcome,
            Err(MachineError::BuiltinTermArgumentExpected(DefaultFunction::HeadList))
        );
    }

    #[test]
    fn test_out_of_budget() {
        // (\x -> x x) (\x -> x x) never terminates
        let omega = Term::lambda(Term::apply(Term::var(1), Term::var(1)));
        let program = Program::new(Term::apply(omega.clone(), omega));
        let result = Machine::new(ExBudget::new(1_000_000, 1_000_000)).evaluate(&program);
        assert!(matches!(result.outcome, Err(MachineError::OutOfBudget { .. })));
    }

    #[test]
    fn test_open_term() {
        let result = eval(&Program::new(Term::var(1)));
        assert_eq!(result.outcome, Err(MachineError::OpenTerm(1)));
    }

    #[test]
    fn test_discharge_substitutes_environment() {
        // (\x -> \y -> x) 5  ==> \y -> 5
        let program = Program::new(Term::apply(
            Term::lambda(Term::lambda(Term::var(2))),
            int(5),
        ));
        assert_eq!(eval(&program).outcome, Ok(Term::lambda(int(5))));
    }

    #[test]
    fn test_trace_collects_logs() {
        let program = Program::new(Term::call(
            DefaultFunction::Trace,
            [
                Term::constant(Constant::String("hello".to_string())),
                Term::unit(),
            ],
        ));
        let result = eval(&program);
        assert_eq!(result.outcome, Ok(Term::unit()));
        assert_eq!(result.logs, vec!["hello".to_string()]);
    }

    #[test]
    fn test_apply_data_arguments() {
        let program = Program::new(Term::lambda(Term::call(
            DefaultFunction::UnIData,
            [Term::var(1)],
        )))
        .apply_data(&[PlutusData::integer(9)]);
        assert_eq!(eval(&program).outcome, Ok(int(9)));
    }
}
