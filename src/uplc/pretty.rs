//! Textual rendering of programs
//!
//! `Display` produces the standard `(program 1.0.0 ...)` syntax with
//! de Bruijn binders named `i_N`; [`disassemble`] lists the terms in flat
//! pre-order, one instruction per line.

use crate::uplc::term::{Constant, ConstantType, Program, Term};
use std::fmt::{self, Write};

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.version;
        write!(f, "(program {}.{}.{} ", v.0, v.1, v.2)?;
        write_term(f, &self.term, 0)?;
        write!(f, ")")
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self, 0)
    }
}

fn binder_name(depth: usize, index: usize) -> String {
    // Binder introduced at depth d is named i_(d-1); index k at depth d names i_(d-k)
    match depth.checked_sub(index) {
        Some(level) if index > 0 => format!("i_{}", level),
        _ => format!("free_{}", index),
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term, depth: usize) -> fmt::Result {
    match term {
        Term::Var(index) => write!(f, "{}", binder_name(depth, *index)),
        Term::Delay(body) => {
            write!(f, "(delay ")?;
            write_term(f, body, depth)?;
            write!(f, ")")
        }
        Term::Lambda(body) => {
            write!(f, "(lam i_{} ", depth)?;
            write_term(f, body, depth + 1)?;
            write!(f, ")")
        }
        Term::Apply(function, argument) => {
            write!(f, "[")?;
            write_term(f, function, depth)?;
            write!(f, " ")?;
            write_term(f, argument, depth)?;
            write!(f, "]")
        }
        Term::Constant(c) => write!(f, "(con {} {})", c.type_of(), ConstantValue(c)),
        Term::Force(body) => {
            write!(f, "(force ")?;
            write_term(f, body, depth)?;
            write!(f, ")")
        }
        Term::Error => write!(f, "(error)"),
        Term::Builtin(fun) => write!(f, "(builtin {})", fun),
    }
}

impl fmt::Display for ConstantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantType::Integer => write!(f, "integer"),
            ConstantType::ByteString => write!(f, "bytestring"),
            ConstantType::String => write!(f, "string"),
            ConstantType::Unit => write!(f, "unit"),
            ConstantType::Bool => write!(f, "bool"),
            ConstantType::List(elem) => write!(f, "(list {})", elem),
            ConstantType::Pair(a, b) => write!(f, "(pair {} {})", a, b),
            ConstantType::Data => write!(f, "data"),
        }
    }
}

/// Value part of a constant, without its type
struct ConstantValue<'a>(&'a Constant);

impl fmt::Display for ConstantValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Constant::Integer(i) => write!(f, "{}", i),
            Constant::ByteString(b) => write!(f, "#{}", hex::encode(b)),
            Constant::String(s) => write!(f, "{:?}", s),
            Constant::Unit => write!(f, "()"),
            Constant::Bool(true) => write!(f, "True"),
            Constant::Bool(false) => write!(f, "False"),
            Constant::ProtoList(_, items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ConstantValue(item))?;
                }
                write!(f, "]")
            }
            Constant::ProtoPair(_, _, a, b) => {
                write!(f, "({}, {})", ConstantValue(a), ConstantValue(b))
            }
            Constant::Data(d) => write!(f, "({})", d),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_of(), ConstantValue(self))
    }
}

/// List the program's terms in pre-order, one per line
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    let mut pc = 0usize;
    disassemble_term(&program.term, 0, &mut pc, &mut output);
    output
}

fn disassemble_term(term: &Term, indent: usize, pc: &mut usize, output: &mut String) {
    let _ = write!(output, "{:04}: {}", pc, "  ".repeat(indent));
    *pc += 1;
    match term {
        Term::Var(i) => {
            let _ = writeln!(output, "VAR {}", i);
        }
        Term::Delay(body) => {
            let _ = writeln!(output, "DELAY");
            disassemble_term(body, indent + 1, pc, output);
        }
        Term::Lambda(body) => {
            let _ = writeln!(output, "LAM");
            disassemble_term(body, indent + 1, pc, output);
        }
        Term::Apply(function, argument) => {
            let _ = writeln!(output, "APPLY");
            disassemble_term(function, indent + 1, pc, output);
            disassemble_term(argument, indent + 1, pc, output);
        }
        Term::Constant(c) => {
            let _ = writeln!(output, "CON {}", c);
        }
        Term::Force(body) => {
            let _ = writeln!(output, "FORCE");
            disassemble_term(body, indent + 1, pc, output);
        }
        Term::Error => {
            let _ = writeln!(output, "ERROR");
        }
        Term::Builtin(fun) => {
            let _ = writeln!(output, "BUILTIN {}", fun);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uplc::builtins::DefaultFunction;
    use crate::uplc::data::PlutusData;

    #[test]
    fn test_program_display() {
        let program = Program::new(Term::lambda(Term::lambda(Term::lambda(Term::unit()))));
        assert_eq!(
            program.to_string(),
            "(program 1.0.0 (lam i_0 (lam i_1 (lam i_2 (con unit ())))))"
        );
    }

    #[test]
    fn test_variable_names_follow_binders() {
        let k = Term::lambda(Term::lambda(Term::var(2)));
        assert_eq!(k.to_string(), "(lam i_0 (lam i_1 i_0))");
    }

    #[test]
    fn test_constant_display() {
        let t = Term::constant(Constant::data_list(vec![PlutusData::integer(3)]));
        assert_eq!(t.to_string(), "(con (list data) [(I 3)])");
        let b = Term::constant(Constant::ByteString(vec![0xde, 0xad]));
        assert_eq!(b.to_string(), "(con bytestring #dead)");
    }

    #[test]
    fn test_disassemble() {
        let program = Program::new(Term::apply(
            Term::builtin(DefaultFunction::HeadList),
            Term::var(1),
        ));
        let listing = disassemble(&program);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "0000: APPLY");
        assert_eq!(lines[1], "0001:   FORCE");
        assert_eq!(lines[2], "0002:     BUILTIN headList");
        assert_eq!(lines[3], "0003:   VAR 1");
    }
}
