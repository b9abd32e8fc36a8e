//! Compiler output

use crate::uplc::flat::{self, FlatError};
use crate::uplc::pretty;
use crate::uplc::term::Program;

/// A lowered validator and its flat encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProgram {
    program: Program,
    bytes: Vec<u8>,
}

impl CompiledProgram {
    pub fn new(program: Program) -> Self {
        let bytes = flat::encode_program(&program);
        Self { program, bytes }
    }

    /// Decode flat bytes back into a program
    pub fn from_flat(bytes: &[u8]) -> Result<Self, FlatError> {
        let program = flat::decode_program(bytes)?;
        Ok(Self {
            program,
            bytes: bytes.to_vec(),
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Flat-encoded program
    pub fn flat_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Pre-order instruction listing
    pub fn disassemble(&self) -> String {
        pretty::disassemble(&self.program)
    }
}
