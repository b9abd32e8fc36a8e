//! Minimal CBOR codec
//!
//! Covers the subset of RFC 8949 that scripts and Plutus data need:
//! unsigned/negative integers, bignums, byte strings (definite and chunked),
//! arrays, maps and tags.

use byteorder::{BigEndian, ByteOrder};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Major type: unsigned integer
pub const MAJOR_UNSIGNED: u8 = 0;
/// Major type: negative integer
pub const MAJOR_NEGATIVE: u8 = 1;
/// Major type: byte string
pub const MAJOR_BYTES: u8 = 2;
/// Major type: text string
pub const MAJOR_TEXT: u8 = 3;
/// Major type: array
pub const MAJOR_ARRAY: u8 = 4;
/// Major type: map
pub const MAJOR_MAP: u8 = 5;
/// Major type: tag
pub const MAJOR_TAG: u8 = 6;
/// Major type: simple values and the break marker
pub const MAJOR_SIMPLE: u8 = 7;

/// Tag for a positive bignum
pub const TAG_POSITIVE_BIGNUM: u64 = 2;
/// Tag for a negative bignum
pub const TAG_NEGATIVE_BIGNUM: u64 = 3;

/// Additional-info value marking indefinite length
const INDEFINITE: u8 = 31;
/// The "break" stop code
const BREAK: u8 = 0xff;

// =============================================================================
// Errors
// =============================================================================

/// CBOR codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("Unexpected major type {found} at byte {position} (expected {expected})")]
    UnexpectedMajor {
        expected: u8,
        found: u8,
        position: usize,
    },
    #[error("Unsupported additional info {0}")]
    UnsupportedAdditional(u8),
    #[error("Integer out of range")]
    IntegerOverflow,
    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("Indefinite length not allowed here")]
    UnexpectedIndefinite,
    #[error("{0} trailing bytes after CBOR item")]
    TrailingBytes(usize),
}

// =============================================================================
// Encoder
// =============================================================================

/// Append-only CBOR writer
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create an empty encoder
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Write an item head with the shortest argument encoding
    pub fn head(&mut self, major: u8, value: u64) -> &mut Self {
        let m = major << 5;
        if value < 24 {
            self.buf.push(m | value as u8);
        } else if value <= u8::MAX as u64 {
            self.buf.push(m | 24);
            self.buf.push(value as u8);
        } else if value <= u16::MAX as u64 {
            let mut b = [0u8; 2];
            BigEndian::write_u16(&mut b, value as u16);
            self.buf.push(m | 25);
            self.buf.extend_from_slice(&b);
        } else if value <= u32::MAX as u64 {
            let mut b = [0u8; 4];
            BigEndian::write_u32(&mut b, value as u32);
            self.buf.push(m | 26);
            self.buf.extend_from_slice(&b);
        } else {
            let mut b = [0u8; 8];
            BigEndian::write_u64(&mut b, value);
            self.buf.push(m | 27);
            self.buf.extend_from_slice(&b);
        }
        self
    }

    /// Write a signed integer, falling back to bignum tags outside 64 bits
    pub fn int(&mut self, value: &BigInt) -> &mut Self {
        let (major, tag, magnitude) = match value.sign() {
            Sign::Minus => (
                MAJOR_NEGATIVE,
                TAG_NEGATIVE_BIGNUM,
                (-value - 1u32).magnitude().clone(),
            ),
            _ => (MAJOR_UNSIGNED, TAG_POSITIVE_BIGNUM, value.magnitude().clone()),
        };
        match magnitude.to_u64() {
            Some(small) => self.head(major, small),
            None => {
                self.tag(tag);
                self.bytes(&magnitude.to_bytes_be())
            }
        }
    }

    /// Write a definite-length byte string
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.head(MAJOR_BYTES, data.len() as u64);
        self.buf.extend_from_slice(data);
        self
    }

    /// Write an indefinite-length byte string split into `chunk`-sized pieces
    pub fn bytes_chunked(&mut self, data: &[u8], chunk: usize) -> &mut Self {
        self.buf.push((MAJOR_BYTES << 5) | INDEFINITE);
        for piece in data.chunks(chunk.max(1)) {
            self.bytes(piece);
        }
        self.brk()
    }

    /// Write a definite-length array header
    pub fn array(&mut self, len: u64) -> &mut Self {
        self.head(MAJOR_ARRAY, len)
    }

    /// Start an indefinite-length array; close it with [`Encoder::brk`]
    pub fn begin_array(&mut self) -> &mut Self {
        self.buf.push((MAJOR_ARRAY << 5) | INDEFINITE);
        self
    }

    /// Write a definite-length map header
    pub fn map(&mut self, len: u64) -> &mut Self {
        self.head(MAJOR_MAP, len)
    }

    /// Write a tag
    pub fn tag(&mut self, tag: u64) -> &mut Self {
        self.head(MAJOR_TAG, tag)
    }

    /// Write the break stop code
    pub fn brk(&mut self) -> &mut Self {
        self.buf.push(BREAK);
        self
    }

    /// Append pre-encoded CBOR
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    /// Finish and return the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode `data` as a single definite-length CBOR byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.bytes(data);
    enc.into_bytes()
}

/// Decode a buffer holding exactly one CBOR byte string
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u8>, CborError> {
    let mut dec = Decoder::new(data);
    let out = dec.bytes()?;
    dec.finish()?;
    Ok(out)
}

// =============================================================================
// Decoder
// =============================================================================

/// Item head as read from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub major: u8,
    /// `None` for indefinite length
    pub value: Option<u64>,
}

/// Cursor-based CBOR reader
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether all input has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Fail unless all input has been consumed
    pub fn finish(&self) -> Result<(), CborError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CborError::TrailingBytes(self.data.len() - self.pos))
        }
    }

    /// Major type of the next item without consuming it
    pub fn peek_major(&self) -> Result<u8, CborError> {
        self.data
            .get(self.pos)
            .map(|b| b >> 5)
            .ok_or(CborError::UnexpectedEof(self.pos))
    }

    /// Whether the next byte is the break stop code
    pub fn at_break(&self) -> bool {
        self.data.get(self.pos) == Some(&BREAK)
    }

    /// Consume a break stop code
    pub fn consume_break(&mut self) -> Result<(), CborError> {
        if self.at_break() {
            self.pos += 1;
            Ok(())
        } else {
            Err(CborError::UnexpectedMajor {
                expected: MAJOR_SIMPLE,
                found: self.peek_major()?,
                position: self.pos,
            })
        }
    }

    fn take(&mut self, n: u64) -> Result<&'a [u8], CborError> {
        let end = usize::try_from(n)
            .ok()
            .and_then(|n| self.pos.checked_add(n))
            .filter(|end| *end <= self.data.len())
            .ok_or(CborError::UnexpectedEof(self.data.len()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read the next item head
    pub fn head(&mut self) -> Result<Head, CborError> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let value = match info {
            0..=23 => Some(info as u64),
            24 => Some(self.take(1)?[0] as u64),
            25 => Some(BigEndian::read_u16(self.take(2)?) as u64),
            26 => Some(BigEndian::read_u32(self.take(4)?) as u64),
            27 => Some(BigEndian::read_u64(self.take(8)?)),
            INDEFINITE => None,
            other => return Err(CborError::UnsupportedAdditional(other)),
        };
        Ok(Head { major, value })
    }

    fn expect_head(&mut self, major: u8) -> Result<Option<u64>, CborError> {
        let position = self.pos;
        let head = self.head()?;
        if head.major != major {
            return Err(CborError::UnexpectedMajor {
                expected: major,
                found: head.major,
                position,
            });
        }
        Ok(head.value)
    }

    /// Read a byte string, joining chunks of an indefinite one
    pub fn bytes(&mut self) -> Result<Vec<u8>, CborError> {
        match self.expect_head(MAJOR_BYTES)? {
            Some(len) => Ok(self.take(len)?.to_vec()),
            None => {
                let mut out = Vec::new();
                while !self.at_break() {
                    let len = self
                        .expect_head(MAJOR_BYTES)?
                        .ok_or(CborError::UnexpectedIndefinite)?;
                    out.extend_from_slice(self.take(len)?);
                }
                self.consume_break()?;
                Ok(out)
            }
        }
    }

    /// Read an array header; `None` means indefinite length
    pub fn array(&mut self) -> Result<Option<u64>, CborError> {
        self.expect_head(MAJOR_ARRAY)
    }

    /// Read a map header; `None` means indefinite length
    pub fn map(&mut self) -> Result<Option<u64>, CborError> {
        self.expect_head(MAJOR_MAP)
    }

    /// Read a tag number
    pub fn tag(&mut self) -> Result<u64, CborError> {
        self.expect_head(MAJOR_TAG)?
            .ok_or(CborError::UnexpectedIndefinite)
    }

    /// Read an integer (plain or bignum)
    pub fn int(&mut self) -> Result<BigInt, CborError> {
        let position = self.pos;
        let head = self.head()?;
        let value = head.value.ok_or(CborError::UnexpectedIndefinite)?;
        match head.major {
            MAJOR_UNSIGNED => Ok(BigInt::from(value)),
            MAJOR_NEGATIVE => Ok(-BigInt::from(value) - 1),
            MAJOR_TAG if value == TAG_POSITIVE_BIGNUM => {
                Ok(BigInt::from(BigUint::from_bytes_be(&self.bytes()?)))
            }
            MAJOR_TAG if value == TAG_NEGATIVE_BIGNUM => {
                Ok(-BigInt::from(BigUint::from_bytes_be(&self.bytes()?)) - 1)
            }
            found => Err(CborError::UnexpectedMajor {
                expected: MAJOR_UNSIGNED,
                found,
                position,
            }),
        }
    }
}
