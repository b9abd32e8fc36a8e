//! Flat encoding of Plutus Core programs
//!
//! Bit-level serialization used for on-chain scripts:
//! - 4-bit term tags, 7-bit builtin tags, 4-bit constant type tags
//! - naturals as little-endian 7-bit groups with a continuation bit
//! - integers zig-zag encoded, then as naturals
//! - byte strings aligned with a filler, then in chunks of at most 255 bytes
//! - lists as a 1-bit "cons" marker per element and a 0 terminator
//! - a filler (zeros ending in a 1) closes the program on a byte boundary

use crate::codec::cbor::{CborError, Decoder as CborDecoder};
use crate::uplc::builtins::DefaultFunction;
use crate::uplc::data::PlutusData;
use crate::uplc::term::{Constant, ConstantType, Program, Term, Version};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use thiserror::Error;

// =============================================================================
// Tags
// =============================================================================

const TERM_TAG_BITS: u8 = 4;
const BUILTIN_TAG_BITS: u8 = 7;
const TYPE_TAG_BITS: u8 = 4;

const TAG_VAR: u8 = 0;
const TAG_DELAY: u8 = 1;
const TAG_LAMBDA: u8 = 2;
const TAG_APPLY: u8 = 3;
const TAG_CONSTANT: u8 = 4;
const TAG_FORCE: u8 = 5;
const TAG_ERROR: u8 = 6;
const TAG_BUILTIN: u8 = 7;

const TYPE_INTEGER: u8 = 0;
const TYPE_BYTESTRING: u8 = 1;
const TYPE_STRING: u8 = 2;
const TYPE_UNIT: u8 = 3;
const TYPE_BOOL: u8 = 4;
const TYPE_LIST: u8 = 5;
const TYPE_PAIR: u8 = 6;
const TYPE_APPLY: u8 = 7;
const TYPE_DATA: u8 = 8;

/// Largest chunk of a flat byte string
const MAX_CHUNK: usize = 255;

/// Deepest term nesting accepted by the decoder
pub const MAX_TERM_DEPTH: usize = 1024;
/// Longest constant type tag list accepted by the decoder
const MAX_TYPE_TAGS: usize = 64;

// =============================================================================
// Errors
// =============================================================================

/// Flat decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlatError {
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),
    #[error("Unknown term tag {0}")]
    UnknownTermTag(u8),
    #[error("Term tag {0} is not supported by this version")]
    UnsupportedTerm(u8),
    #[error("Unknown builtin tag {0}")]
    UnknownBuiltin(u8),
    #[error("Invalid constant type tags {0:?}")]
    InvalidType(Vec<u8>),
    #[error("Malformed filler at byte {0}")]
    BadFiller(usize),
    #[error("Natural number out of range")]
    NaturalOverflow,
    #[error("Term nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("Invalid UTF-8 in string constant")]
    InvalidUtf8,
    #[error("Invalid data constant: {0}")]
    Data(#[from] CborError),
    #[error("{0} trailing bytes after program")]
    TrailingData(usize),
}

// =============================================================================
// Encoder
// =============================================================================

/// Bit writer producing flat-encoded bytes
#[derive(Debug, Default)]
pub struct FlatEncoder {
    buf: Vec<u8>,
    current: u8,
    used: u8,
}

impl FlatEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bit(&mut self, value: bool) {
        if value {
            self.current |= 0x80 >> self.used;
        }
        self.used += 1;
        if self.used == 8 {
            self.buf.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    /// Write the low `n` bits of `value`, most significant first
    fn bits(&mut self, n: u8, value: u8) {
        for i in (0..n).rev() {
            self.bit((value >> i) & 1 == 1);
        }
    }

    /// Pad with zeros and a final 1 up to the next byte boundary
    fn filler(&mut self) {
        self.current |= 1;
        self.buf.push(self.current);
        self.current = 0;
        self.used = 0;
    }

    fn natural(&mut self, n: &BigUint) {
        let digits = n.to_radix_le(128);
        let last = digits.len() - 1;
        for (i, digit) in digits.into_iter().enumerate() {
            let more = if i < last { 0x80 } else { 0 };
            self.bits(8, digit | more);
        }
    }

    fn small_natural(&mut self, n: u64) {
        self.natural(&BigUint::from(n));
    }

    /// Zig-zag: 0, -1, 1, -2 ... map to 0, 1, 2, 3 ...
    fn integer(&mut self, i: &BigInt) {
        let zigzag = match i.sign() {
            Sign::Minus => (i.magnitude() << 1u32) - 1u32,
            _ => i.magnitude() << 1u32,
        };
        self.natural(&zigzag);
    }

    fn bytestring(&mut self, bytes: &[u8]) {
        self.filler();
        for chunk in bytes.chunks(MAX_CHUNK) {
            self.buf.push(chunk.len() as u8);
            self.buf.extend_from_slice(chunk);
        }
        self.buf.push(0);
    }

    fn program(&mut self, program: &Program) {
        let Version(major, minor, patch) = program.version;
        self.small_natural(major);
        self.small_natural(minor);
        self.small_natural(patch);
        self.term(&program.term);
        self.filler();
    }

    fn term(&mut self, term: &Term) {
        match term {
            Term::Var(index) => {
                self.bits(TERM_TAG_BITS, TAG_VAR);
                self.small_natural(*index as u64);
            }
            Term::Delay(body) => {
                self.bits(TERM_TAG_BITS, TAG_DELAY);
                self.term(body);
            }
            Term::Lambda(body) => {
                self.bits(TERM_TAG_BITS, TAG_LAMBDA);
                self.term(body);
            }
            Term::Apply(function, argument) => {
                self.bits(TERM_TAG_BITS, TAG_APPLY);
                self.term(function);
                self.term(argument);
            }
            Term::Constant(value) => {
                self.bits(TERM_TAG_BITS, TAG_CONSTANT);
                let mut tags = Vec::new();
                type_tags(&value.type_of(), &mut tags);
                for tag in tags {
                    self.bit(true);
                    self.bits(TYPE_TAG_BITS, tag);
                }
                self.bit(false);
                self.constant(value);
            }
            Term::Force(body) => {
                self.bits(TERM_TAG_BITS, TAG_FORCE);
                self.term(body);
            }
            Term::Error => self.bits(TERM_TAG_BITS, TAG_ERROR),
            Term::Builtin(fun) => {
                self.bits(TERM_TAG_BITS, TAG_BUILTIN);
                self.bits(BUILTIN_TAG_BITS, fun.tag());
            }
        }
    }

    fn constant(&mut self, value: &Constant) {
        match value {
            Constant::Integer(i) => self.integer(i),
            Constant::ByteString(b) => self.bytestring(b),
            Constant::String(s) => self.bytestring(s.as_bytes()),
            Constant::Unit => {}
            Constant::Bool(b) => self.bit(*b),
            Constant::ProtoList(_, items) => {
                for item in items {
                    self.bit(true);
                    self.constant(item);
                }
                self.bit(false);
            }
            Constant::ProtoPair(_, _, a, b) => {
                self.constant(a);
                self.constant(b);
            }
            Constant::Data(d) => self.bytestring(&d.to_cbor()),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn type_tags(ty: &ConstantType, out: &mut Vec<u8>) {
    match ty {
        ConstantType::Integer => out.push(TYPE_INTEGER),
        ConstantType::ByteString => out.push(TYPE_BYTESTRING),
        ConstantType::String => out.push(TYPE_STRING),
        ConstantType::Unit => out.push(TYPE_UNIT),
        ConstantType::Bool => out.push(TYPE_BOOL),
        ConstantType::List(elem) => {
            out.extend_from_slice(&[TYPE_APPLY, TYPE_LIST]);
            type_tags(elem, out);
        }
        ConstantType::Pair(a, b) => {
            out.extend_from_slice(&[TYPE_APPLY, TYPE_APPLY, TYPE_PAIR]);
            type_tags(a, out);
            type_tags(b, out);
        }
        ConstantType::Data => out.push(TYPE_DATA),
    }
}

/// Flat-encode a program
pub fn encode_program(program: &Program) -> Vec<u8> {
    let mut enc = FlatEncoder::new();
    enc.program(program);
    enc.into_bytes()
}

// =============================================================================
// Decoder
// =============================================================================

/// Bit reader over flat-encoded bytes
#[derive(Debug)]
pub struct FlatDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    offset: u8,
}

impl<'a> FlatDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            offset: 0,
        }
    }

    fn bit(&mut self) -> Result<bool, FlatError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(FlatError::UnexpectedEnd(self.pos))?;
        let value = (byte >> (7 - self.offset)) & 1 == 1;
        self.offset += 1;
        if self.offset == 8 {
            self.pos += 1;
            self.offset = 0;
        }
        Ok(value)
    }

    fn bits(&mut self, n: u8) -> Result<u8, FlatError> {
        let mut value = 0u8;
        for _ in 0..n {
            value = (value << 1) | self.bit()? as u8;
        }
        Ok(value)
    }

    fn filler(&mut self) -> Result<(), FlatError> {
        while !self.bit()? {}
        if self.offset != 0 {
            return Err(FlatError::BadFiller(self.pos));
        }
        Ok(())
    }

    fn byte(&mut self) -> Result<u8, FlatError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(FlatError::UnexpectedEnd(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn big_natural(&mut self) -> Result<BigUint, FlatError> {
        let mut digits = Vec::new();
        loop {
            let word = self.bits(8)?;
            digits.push(word & 0x7f);
            if word & 0x80 == 0 {
                return BigUint::from_radix_le(&digits, 128).ok_or(FlatError::NaturalOverflow);
            }
        }
    }

    fn natural(&mut self) -> Result<u64, FlatError> {
        self.big_natural()?
            .to_u64()
            .ok_or(FlatError::NaturalOverflow)
    }

    fn integer(&mut self) -> Result<BigInt, FlatError> {
        let n = self.big_natural()?;
        let negative = n.bit(0);
        let half = BigInt::from(n >> 1u32);
        Ok(if negative { -half - 1 } else { half })
    }

    fn bytestring(&mut self) -> Result<Vec<u8>, FlatError> {
        self.filler()?;
        let mut out = Vec::new();
        loop {
            let len = self.byte()? as usize;
            if len == 0 {
                return Ok(out);
            }
            if self.pos + len > self.data.len() {
                return Err(FlatError::UnexpectedEnd(self.data.len()));
            }
            out.extend_from_slice(&self.data[self.pos..self.pos + len]);
            self.pos += len;
        }
    }

    fn program(&mut self) -> Result<Program, FlatError> {
        let major = self.natural()?;
        let minor = self.natural()?;
        let patch = self.natural()?;
        let term = self.term(0)?;
        self.filler()?;
        if self.pos != self.data.len() {
            return Err(FlatError::TrailingData(self.data.len() - self.pos));
        }
        Ok(Program {
            version: Version(major, minor, patch),
            term,
        })
    }

    fn term(&mut self, depth: usize) -> Result<Term, FlatError> {
        if depth >= MAX_TERM_DEPTH {
            return Err(FlatError::TooDeep(MAX_TERM_DEPTH));
        }
        let inner = depth + 1;
        let tag = self.bits(TERM_TAG_BITS)?;
        match tag {
            TAG_VAR => {
                let index = usize::try_from(self.natural()?).map_err(|_| FlatError::NaturalOverflow)?;
                Ok(Term::Var(index))
            }
            TAG_DELAY => Ok(Term::delay(self.term(inner)?)),
            TAG_LAMBDA => Ok(Term::lambda(self.term(inner)?)),
            TAG_APPLY => {
                let function = self.term(inner)?;
                let argument = self.term(inner)?;
                Ok(Term::apply(function, argument))
            }
            TAG_CONSTANT => {
                let mut tags = Vec::new();
                while self.bit()? {
                    if tags.len() == MAX_TYPE_TAGS {
                        return Err(FlatError::InvalidType(tags));
                    }
                    tags.push(self.bits(TYPE_TAG_BITS)?);
                }
                let mut cursor = 0;
                let ty = parse_type(&tags, &mut cursor)?;
                if cursor != tags.len() {
                    return Err(FlatError::InvalidType(tags));
                }
                Ok(Term::constant(self.constant(&ty)?))
            }
            TAG_FORCE => Ok(Term::force(self.term(inner)?)),
            TAG_ERROR => Ok(Term::Error),
            TAG_BUILTIN => {
                let fun_tag = self.bits(BUILTIN_TAG_BITS)?;
                DefaultFunction::from_tag(fun_tag)
                    .map(Term::Builtin)
                    .ok_or(FlatError::UnknownBuiltin(fun_tag))
            }
            // constr and case belong to the 1.1.0 language
            8 | 9 => Err(FlatError::UnsupportedTerm(tag)),
            other => Err(FlatError::UnknownTermTag(other)),
        }
    }

    fn constant(&mut self, ty: &ConstantType) -> Result<Constant, FlatError> {
        Ok(match ty {
            ConstantType::Integer => Constant::Integer(self.integer()?),
            ConstantType::ByteString => Constant::ByteString(self.bytestring()?),
            ConstantType::String => Constant::String(
                String::from_utf8(self.bytestring()?).map_err(|_| FlatError::InvalidUtf8)?,
            ),
            ConstantType::Unit => Constant::Unit,
            ConstantType::Bool => Constant::Bool(self.bit()?),
            ConstantType::List(elem) => {
                let mut items = Vec::new();
                while self.bit()? {
                    items.push(self.constant(elem)?);
                }
                Constant::ProtoList((**elem).clone(), items)
            }
            ConstantType::Pair(a, b) => {
                let first = self.constant(a)?;
                let second = self.constant(b)?;
                Constant::ProtoPair(
                    (**a).clone(),
                    (**b).clone(),
                    Box::new(first),
                    Box::new(second),
                )
            }
            ConstantType::Data => {
                let cbor = self.bytestring()?;
                let mut dec = CborDecoder::new(&cbor);
                let data = PlutusData::decode(&mut dec)?;
                dec.finish()?;
                Constant::Data(data)
            }
        })
    }
}

fn parse_type(tags: &[u8], cursor: &mut usize) -> Result<ConstantType, FlatError> {
    let invalid = || FlatError::InvalidType(tags.to_vec());
    let tag = *tags.get(*cursor).ok_or_else(invalid)?;
    *cursor += 1;
    match tag {
        TYPE_INTEGER => Ok(ConstantType::Integer),
        TYPE_BYTESTRING => Ok(ConstantType::ByteString),
        TYPE_STRING => Ok(ConstantType::String),
        TYPE_UNIT => Ok(ConstantType::Unit),
        TYPE_BOOL => Ok(ConstantType::Bool),
        TYPE_DATA => Ok(ConstantType::Data),
        TYPE_APPLY => {
            let next = *tags.get(*cursor).ok_or_else(invalid)?;
            *cursor += 1;
            match next {
                TYPE_LIST => Ok(ConstantType::List(Box::new(parse_type(tags, cursor)?))),
                TYPE_APPLY => {
                    let pair = *tags.get(*cursor).ok_or_else(invalid)?;
                    *cursor += 1;
                    if pair != TYPE_PAIR {
                        return Err(invalid());
                    }
                    let a = parse_type(tags, cursor)?;
                    let b = parse_type(tags, cursor)?;
                    Ok(ConstantType::Pair(Box::new(a), Box::new(b)))
                }
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

/// Decode a flat-encoded program, rejecting trailing bytes
pub fn decode_program(bytes: &[u8]) -> Result<Program, FlatError> {
    FlatDecoder::new(bytes).program()
}
