//! Plutus data
//!
//! The untyped data values passed to validators as datum, redeemer and
//! script context, with their ledger CBOR encoding.

use crate::codec::cbor::{
    CborError, Decoder, Encoder, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG,
    MAJOR_UNSIGNED, TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM,
};
use num_bigint::BigInt;
use std::fmt;

/// Deepest constructor/list/map nesting accepted when decoding
pub const MAX_DATA_DEPTH: usize = 256;

/// Byte strings longer than this are written as indefinite chunks
const BYTES_CHUNK_SIZE: usize = 64;

/// Compact constructor tags 0..=6 map to CBOR tags 121..=127
const COMPACT_TAG_BASE: u64 = 121;
/// Constructor tags 7..=127 map to CBOR tags 1280..=1400
const EXTENDED_TAG_BASE: u64 = 1280;
/// Any other constructor uses tag 102 with an explicit `[tag, fields]` pair
const GENERAL_CONSTR_TAG: u64 = 102;

/// A Plutus data value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    /// Constructor application: tag and fields
    Constr(u64, Vec<PlutusData>),
    /// Association list
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(BigInt),
    Bytes(Vec<u8>),
}

impl PlutusData {
    /// Constructor with no fields
    pub fn unit_constr(tag: u64) -> Self {
        PlutusData::Constr(tag, Vec::new())
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        PlutusData::Integer(value.into())
    }

    /// Encode a boolean the way the ledger does (False = 0, True = 1)
    pub fn bool(value: bool) -> Self {
        PlutusData::unit_constr(value as u64)
    }

    /// Serialize to CBOR
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }

    /// Write this value into an encoder
    pub fn encode(&self, enc: &mut Encoder) {
        match self {
            PlutusData::Constr(tag, fields) => {
                if *tag < 7 {
                    enc.tag(COMPACT_TAG_BASE + tag);
                    encode_list(enc, fields);
                } else if *tag < 128 {
                    enc.tag(EXTENDED_TAG_BASE + tag - 7);
                    encode_list(enc, fields);
                } else {
                    enc.tag(GENERAL_CONSTR_TAG);
                    enc.array(2);
                    enc.int(&BigInt::from(*tag));
                    encode_list(enc, fields);
                }
            }
            PlutusData::Map(entries) => {
                enc.map(entries.len() as u64);
                for (k, v) in entries {
                    k.encode(enc);
                    v.encode(enc);
                }
            }
            PlutusData::List(items) => encode_list(enc, items),
            PlutusData::Integer(i) => {
                enc.int(i);
            }
            PlutusData::Bytes(b) => {
                if b.len() <= BYTES_CHUNK_SIZE {
                    enc.bytes(b);
                } else {
                    enc.bytes_chunked(b, BYTES_CHUNK_SIZE);
                }
            }
        }
    }

    /// Parse a buffer holding exactly one CBOR-encoded data value
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CborError> {
        let mut dec = Decoder::new(bytes);
        let data = Self::decode(&mut dec)?;
        dec.finish()?;
        Ok(data)
    }

    /// Read one data value from a decoder
    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self, CborError> {
        Self::decode_nested(dec, 0)
    }

    fn decode_nested(dec: &mut Decoder<'_>, depth: usize) -> Result<Self, CborError> {
        if depth > MAX_DATA_DEPTH {
            return Err(CborError::TooDeep(MAX_DATA_DEPTH));
        }
        let depth = depth + 1;
        let position = dec.position();
        match dec.peek_major()? {
            MAJOR_UNSIGNED | MAJOR_NEGATIVE => Ok(PlutusData::Integer(dec.int()?)),
            MAJOR_BYTES => Ok(PlutusData::Bytes(dec.bytes()?)),
            MAJOR_ARRAY => Ok(PlutusData::List(decode_list(dec, depth)?)),
            MAJOR_MAP => {
                let mut entries = Vec::new();
                match dec.map()? {
                    Some(len) => {
                        for _ in 0..len {
                            let k = Self::decode_nested(dec, depth)?;
                            let v = Self::decode_nested(dec, depth)?;
                            entries.push((k, v));
                        }
                    }
                    None => {
                        while !dec.at_break() {
                            let k = Self::decode_nested(dec, depth)?;
                            let v = Self::decode_nested(dec, depth)?;
                            entries.push((k, v));
                        }
                        dec.consume_break()?;
                    }
                }
                Ok(PlutusData::Map(entries))
            }
            MAJOR_TAG => {
                // Peek the tag without consuming: bignums are read by `int`
                let mut probe = dec.clone();
                let tag = probe.tag()?;
                if tag == TAG_POSITIVE_BIGNUM || tag == TAG_NEGATIVE_BIGNUM {
                    return Ok(PlutusData::Integer(dec.int()?));
                }
                dec.tag()?;
                match tag {
                    121..=127 => Ok(PlutusData::Constr(tag - COMPACT_TAG_BASE, decode_list(dec, depth)?)),
                    1280..=1400 => Ok(PlutusData::Constr(
                        tag - EXTENDED_TAG_BASE + 7,
                        decode_list(dec, depth)?,
                    )),
                    GENERAL_CONSTR_TAG => {
                        let len = dec.array()?;
                        if len != Some(2) {
                            return Err(CborError::UnexpectedIndefinite);
                        }
                        let constr = u64::try_from(dec.int()?).map_err(|_| CborError::IntegerOverflow)?;
                        Ok(PlutusData::Constr(constr, decode_list(dec, depth)?))
                    }
                    _ => Err(CborError::UnexpectedMajor {
                        expected: MAJOR_TAG,
                        found: MAJOR_TAG,
                        position,
                    }),
                }
            }
            found => Err(CborError::UnexpectedMajor {
                expected: MAJOR_ARRAY,
                found,
                position,
            }),
        }
    }
}

fn encode_list(enc: &mut Encoder, items: &[PlutusData]) {
    if items.is_empty() {
        enc.array(0);
        return;
    }
    enc.begin_array();
    for item in items {
        item.encode(enc);
    }
    enc.brk();
}

fn decode_list(dec: &mut Decoder<'_>, depth: usize) -> Result<Vec<PlutusData>, CborError> {
    let mut items = Vec::new();
    match dec.array()? {
        Some(len) => {
            for _ in 0..len {
                items.push(PlutusData::decode_nested(dec, depth)?);
            }
        }
        None => {
            while !dec.at_break() {
                items.push(PlutusData::decode_nested(dec, depth)?);
            }
            dec.consume_break()?;
        }
    }
    Ok(items)
}

impl fmt::Display for PlutusData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlutusData::Constr(tag, fields) => {
                write!(f, "Constr {} [", tag)?;
                write_joined(f, fields)?;
                write!(f, "]")
            }
            PlutusData::Map(entries) => {
                write!(f, "Map [")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({}, {})", k, v)?;
                }
                write!(f, "]")
            }
            PlutusData::List(items) => {
                write!(f, "List [")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            PlutusData::Integer(i) => write!(f, "I {}", i),
            PlutusData::Bytes(b) => write!(f, "B #{}", hex::encode(b)),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[PlutusData]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_constr_encoding() {
        // Constr 0 [] is the well-known "unit datum" d87980
        assert_eq!(hex::encode(PlutusData::unit_constr(0).to_cbor()), "d87980");
    }

    #[test]
    fn test_nonempty_fields_are_indefinite() {
        let data = PlutusData::Constr(1, vec![PlutusData::integer(42)]);
        assert_eq!(hex::encode(data.to_cbor()), "d87a9f182aff");
    }

    #[test]
    fn test_constructor_tag_ranges() {
        for tag in [0u64, 6, 7, 127, 128, 1000] {
            let data = PlutusData::Constr(tag, vec![PlutusData::Bytes(vec![1, 2])]);
            assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
        }
    }

    #[test]
    fn test_long_bytes_are_chunked() {
        let data = PlutusData::Bytes(vec![7u8; 100]);
        let cbor = data.to_cbor();
        assert_eq!(cbor[0], 0x5f);
        assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    #[test]
    fn test_nested_structure() {
        let data = PlutusData::Constr(
            0,
            vec![
                PlutusData::Map(vec![(
                    PlutusData::Bytes(vec![]),
                    PlutusData::integer(-7),
                )]),
                PlutusData::List(vec![PlutusData::integer(1), PlutusData::bool(true)]),
            ],
        );
        assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
    }

    #[test]
    fn test_bignum_above_128_bits() {
        let big: BigInt = BigInt::from(1) << 128;
        let mut cbor = vec![0xc2, 0x51, 0x01];
        cbor.extend_from_slice(&[0u8; 16]);
        assert_eq!(
            PlutusData::from_cbor(&cbor).unwrap(),
            PlutusData::Integer(big.clone())
        );
        assert_eq!(PlutusData::Integer(big).to_cbor(), cbor);
    }

    #[test]
    fn test_deep_nesting_rejected() {
        // 100 000 nested single-element arrays around a zero
        let mut cbor = vec![0x81; 100_000];
        cbor.push(0x00);
        assert_eq!(
            PlutusData::from_cbor(&cbor),
            Err(CborError::TooDeep(MAX_DATA_DEPTH))
        );

        let mut shallow = vec![0x81; 10];
        shallow.push(0x00);
        assert!(PlutusData::from_cbor(&shallow).is_ok());
    }

    #[test]
    fn test_display() {
        let data = PlutusData::Constr(0, vec![PlutusData::Bytes(vec![0xab])]);
        assert_eq!(data.to_string(), "Constr 0 [B #ab]");
    }
}
