//! Builtin function semantics
//!
//! Called by the machine once a builtin has received all of its forces and
//! arguments.

use crate::crypto::hash::{blake2b_256, sha256};
use crate::uplc::builtins::DefaultFunction;
use crate::uplc::data::PlutusData;
use crate::uplc::machine::{MachineError, Value};
use crate::uplc::term::{Constant, ConstantType};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;
use std::rc::Rc;

type BuiltinResult = Result<Value, MachineError>;

/// Run a saturated builtin
pub fn call(fun: DefaultFunction, args: Vec<Value>, logs: &mut Vec<String>) -> BuiltinResult {
    use DefaultFunction::*;

    let a = Args { fun, args: &args };
    match fun {
        // Integers
        AddInteger => int(a.int(0)? + a.int(1)?),
        SubtractInteger => int(a.int(0)? - a.int(1)?),
        MultiplyInteger => int(a.int(0)? * a.int(1)?),
        DivideInteger => int(a.int(0)?.div_floor(&nonzero(a.int(1)?)?)),
        ModInteger => int(a.int(0)?.mod_floor(&nonzero(a.int(1)?)?)),
        // `/` and `%` on BigInt truncate towards zero
        QuotientInteger => int(a.int(0)? / nonzero(a.int(1)?)?),
        RemainderInteger => int(a.int(0)? % nonzero(a.int(1)?)?),
        EqualsInteger => boolean(a.int(0)? == a.int(1)?),
        LessThanInteger => boolean(a.int(0)? < a.int(1)?),
        LessThanEqualsInteger => boolean(a.int(0)? <= a.int(1)?),

        // Byte strings
        AppendByteString => {
            let mut out = a.bytes(0)?.to_vec();
            out.extend_from_slice(a.bytes(1)?);
            bytes(out)
        }
        ConsByteString => {
            let byte = a.int(0)?.mod_floor(&BigInt::from(256)).to_u8().unwrap_or_default();
            let mut out = vec![byte];
            out.extend_from_slice(a.bytes(1)?);
            bytes(out)
        }
        SliceByteString => {
            let (start, len, data) = (a.int(0)?, a.int(1)?, a.bytes(2)?);
            let n = BigInt::from(data.len());
            let from = start.clamp(BigInt::zero(), n.clone());
            let to = (&from + len.max(BigInt::zero())).min(n);
            let (from, to) = (clamped_index(&from), clamped_index(&to));
            bytes(data[from..to].to_vec())
        }
        LengthOfByteString => int(BigInt::from(a.bytes(0)?.len())),
        IndexByteString => {
            let (data, index) = (a.bytes(0)?, a.int(1)?);
            index
                .to_usize()
                .and_then(|i| data.get(i))
                .map(|b| Value::con(Constant::integer(*b)))
                .ok_or(MachineError::IndexOutOfRange(index))
        }
        EqualsByteString => boolean(a.bytes(0)? == a.bytes(1)?),
        LessThanByteString => boolean(a.bytes(0)?.cmp(a.bytes(1)?) == Ordering::Less),
        LessThanEqualsByteString => boolean(a.bytes(0)?.cmp(a.bytes(1)?) != Ordering::Greater),

        // Cryptography
        Sha2_256 => bytes(sha256(a.bytes(0)?)),
        Blake2b256 => bytes(blake2b_256(a.bytes(0)?)),
        Sha3_256
        | VerifyEd25519Signature
        | VerifyEcdsaSecp256k1Signature
        | VerifySchnorrSecp256k1Signature => Err(MachineError::UnimplementedBuiltin(fun)),

        // Strings
        AppendString => Ok(Value::con(Constant::String(format!(
            "{}{}",
            a.string(0)?,
            a.string(1)?
        )))),
        EqualsString => boolean(a.string(0)? == a.string(1)?),
        EncodeUtf8 => bytes(a.string(0)?.as_bytes().to_vec()),
        DecodeUtf8 => {
            let text = String::from_utf8(a.bytes(0)?.to_vec()).map_err(|_| MachineError::InvalidUtf8)?;
            Ok(Value::con(Constant::String(text)))
        }

        // Polymorphic control
        IfThenElse => Ok(if a.bool(0)? {
            args[1].clone()
        } else {
            args[2].clone()
        }),
        ChooseUnit => {
            a.unit(0)?;
            Ok(args[1].clone())
        }
        Trace => {
            let message = a.string(0)?.to_string();
            log::debug!("trace: {}", message);
            logs.push(message);
            Ok(args[1].clone())
        }

        // Pairs
        FstPair => {
            let (first, _) = a.pair(0)?;
            Ok(Value::con(first.clone()))
        }
        SndPair => {
            let (_, second) = a.pair(0)?;
            Ok(Value::con(second.clone()))
        }

        // Lists
        ChooseList => {
            let (_, items) = a.list(0)?;
            Ok(if items.is_empty() {
                args[1].clone()
            } else {
                args[2].clone()
            })
        }
        MkCons => {
            let head = a.constant(0)?;
            let (elem, items) = a.list(1)?;
            if head.type_of() != *elem {
                return Err(a.mismatch("a list element"));
            }
            let mut out = Vec::with_capacity(items.len() + 1);
            out.push(head.clone());
            out.extend(items.iter().cloned());
            Ok(Value::con(Constant::ProtoList(elem.clone(), out)))
        }
        HeadList => {
            let (_, items) = a.list(0)?;
            items
                .first()
                .map(|c| Value::con(c.clone()))
                .ok_or(MachineError::EmptyList(fun))
        }
        TailList => {
            let (elem, items) = a.list(0)?;
            if items.is_empty() {
                return Err(MachineError::EmptyList(fun));
            }
            Ok(Value::con(Constant::ProtoList(elem.clone(), items[1..].to_vec())))
        }
        NullList => {
            let (_, items) = a.list(0)?;
            boolean(items.is_empty())
        }

        // Data
        ChooseData => {
            let branch = match a.data(0)? {
                PlutusData::Constr(_, _) => 1,
                PlutusData::Map(_) => 2,
                PlutusData::List(_) => 3,
                PlutusData::Integer(_) => 4,
                PlutusData::Bytes(_) => 5,
            };
            Ok(args[branch].clone())
        }
        ConstrData => {
            let tag = a.int(0)?.to_u64().ok_or(MachineError::IntegerOverflow)?;
            let fields = a.data_items(1)?;
            data(PlutusData::Constr(tag, fields))
        }
        MapData => {
            let (_, items) = a.list(0)?;
            let entries = items
                .iter()
                .map(|item| match item {
                    Constant::ProtoPair(_, _, k, v) => match (k.as_ref(), v.as_ref()) {
                        (Constant::Data(k), Constant::Data(v)) => Ok((k.clone(), v.clone())),
                        _ => Err(a.mismatch("a list of data pairs")),
                    },
                    _ => Err(a.mismatch("a list of data pairs")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            data(PlutusData::Map(entries))
        }
        ListData => data(PlutusData::List(a.data_items(0)?)),
        IData => data(PlutusData::Integer(a.int(0)?)),
        BData => data(PlutusData::Bytes(a.bytes(0)?.to_vec())),
        UnConstrData => match a.data(0)? {
            PlutusData::Constr(tag, fields) => Ok(Value::con(Constant::ProtoPair(
                ConstantType::Integer,
                ConstantType::List(Box::new(ConstantType::Data)),
                Box::new(Constant::integer(*tag)),
                Box::new(Constant::data_list(fields.clone())),
            ))),
            _ => Err(a.mismatch("a constructor data")),
        },
        UnMapData => match a.data(0)? {
            PlutusData::Map(entries) => Ok(Value::con(Constant::ProtoList(
                ConstantType::Pair(Box::new(ConstantType::Data), Box::new(ConstantType::Data)),
                entries
                    .iter()
                    .map(|(k, v)| Constant::data_pair(k.clone(), v.clone()))
                    .collect(),
            ))),
            _ => Err(a.mismatch("a map data")),
        },
        UnListData => match a.data(0)? {
            PlutusData::List(items) => Ok(Value::con(Constant::data_list(items.clone()))),
            _ => Err(a.mismatch("a list data")),
        },
        UnIData => match a.data(0)? {
            PlutusData::Integer(i) => int(i.clone()),
            _ => Err(a.mismatch("an integer data")),
        },
        UnBData => match a.data(0)? {
            PlutusData::Bytes(b) => bytes(b.clone()),
            _ => Err(a.mismatch("a bytes data")),
        },
        EqualsData => boolean(a.data(0)? == a.data(1)?),
        MkPairData => Ok(Value::con(Constant::data_pair(
            a.data(0)?.clone(),
            a.data(1)?.clone(),
        ))),
        MkNilData => {
            a.unit(0)?;
            Ok(Value::con(Constant::data_list(Vec::new())))
        }
        MkNilPairData => {
            a.unit(0)?;
            Ok(Value::con(Constant::ProtoList(
                ConstantType::Pair(Box::new(ConstantType::Data), Box::new(ConstantType::Data)),
                Vec::new(),
            )))
        }
        SerialiseData => bytes(a.data(0)?.to_cbor()),
    }
}

// =============================================================================
// Argument access
// =============================================================================

struct Args<'a> {
    fun: DefaultFunction,
    args: &'a [Value],
}

impl<'a> Args<'a> {
    fn mismatch(&self, expected: &'static str) -> MachineError {
        MachineError::TypeMismatch {
            fun: self.fun,
            expected,
        }
    }

    fn constant(&self, i: usize) -> Result<&'a Constant, MachineError> {
        match self.args.get(i) {
            Some(Value::Con(c)) => Ok(c.as_ref()),
            _ => Err(self.mismatch("a constant")),
        }
    }

    fn int(&self, i: usize) -> Result<BigInt, MachineError> {
        match self.constant(i)? {
            Constant::Integer(v) => Ok(v.clone()),
            _ => Err(self.mismatch("an integer")),
        }
    }

    fn bytes(&self, i: usize) -> Result<&'a [u8], MachineError> {
        match self.constant(i)? {
            Constant::ByteString(b) => Ok(b),
            _ => Err(self.mismatch("a bytestring")),
        }
    }

    fn string(&self, i: usize) -> Result<&'a str, MachineError> {
        match self.constant(i)? {
            Constant::String(s) => Ok(s),
            _ => Err(self.mismatch("a string")),
        }
    }

    fn bool(&self, i: usize) -> Result<bool, MachineError> {
        match self.constant(i)? {
            Constant::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("a bool")),
        }
    }

    fn unit(&self, i: usize) -> Result<(), MachineError> {
        match self.constant(i)? {
            Constant::Unit => Ok(()),
            _ => Err(self.mismatch("a unit")),
        }
    }

    fn data(&self, i: usize) -> Result<&'a PlutusData, MachineError> {
        match self.constant(i)? {
            Constant::Data(d) => Ok(d),
            _ => Err(self.mismatch("a data")),
        }
    }

    fn pair(&self, i: usize) -> Result<(&'a Constant, &'a Constant), MachineError> {
        match self.constant(i)? {
            Constant::ProtoPair(_, _, first, second) => Ok((first.as_ref(), second.as_ref())),
            _ => Err(self.mismatch("a pair")),
        }
    }

    fn list(&self, i: usize) -> Result<(&'a ConstantType, &'a [Constant]), MachineError> {
        match self.constant(i)? {
            Constant::ProtoList(elem, items) => Ok((elem, items.as_slice())),
            _ => Err(self.mismatch("a list")),
        }
    }

    fn data_items(&self, i: usize) -> Result<Vec<PlutusData>, MachineError> {
        let (_, items) = self.list(i)?;
        items
            .iter()
            .map(|item| match item {
                Constant::Data(d) => Ok(d.clone()),
                _ => Err(self.mismatch("a list of data")),
            })
            .collect()
    }
}

fn int(value: BigInt) -> BuiltinResult {
    Ok(Value::con(Constant::Integer(value)))
}

fn bytes(value: Vec<u8>) -> BuiltinResult {
    Ok(Value::con(Constant::ByteString(value)))
}

fn boolean(value: bool) -> BuiltinResult {
    Ok(Value::con(Constant::Bool(value)))
}

fn data(value: PlutusData) -> BuiltinResult {
    Ok(Value::Con(Rc::new(Constant::Data(value))))
}

fn nonzero(value: BigInt) -> Result<BigInt, MachineError> {
    if value.is_zero() {
        Err(MachineError::DivisionByZero)
    } else {
        Ok(value)
    }
}

/// Index already clamped to `0..=len`
fn clamped_index(value: &BigInt) -> usize {
    value.to_usize().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fun: DefaultFunction, args: Vec<Constant>) -> Result<Constant, MachineError> {
        let values = args.into_iter().map(Value::con).collect();
        match call(fun, values, &mut Vec::new())? {
            Value::Con(c) => Ok((*c).clone()),
            _ => panic!("expected a constant"),
        }
    }

    #[test]
    fn test_integer_division_rounding() {
        let i = |v: i64| Constant::integer(v);
        assert_eq!(run(DefaultFunction::DivideInteger, vec![i(-7), i(2)]), Ok(i(-4)));
        assert_eq!(run(DefaultFunction::QuotientInteger, vec![i(-7), i(2)]), Ok(i(-3)));
        assert_eq!(run(DefaultFunction::ModInteger, vec![i(-7), i(2)]), Ok(i(1)));
        assert_eq!(run(DefaultFunction::RemainderInteger, vec![i(-7), i(2)]), Ok(i(-1)));
        assert_eq!(
            run(DefaultFunction::DivideInteger, vec![i(1), i(0)]),
            Err(MachineError::DivisionByZero)
        );
    }

    #[test]
    fn test_arithmetic_beyond_64_bits() {
        let big: BigInt = BigInt::from(1) << 127;
        assert_eq!(
            run(
                DefaultFunction::MultiplyInteger,
                vec![Constant::Integer(big.clone()), Constant::integer(4)]
            ),
            Ok(Constant::Integer(big << 2))
        );
    }

    #[test]
    fn test_slice_clamps() {
        let data = Constant::ByteString(vec![1, 2, 3, 4]);
        assert_eq!(
            run(
                DefaultFunction::SliceByteString,
                vec![Constant::integer(2), Constant::integer(10), data.clone()]
            ),
            Ok(Constant::ByteString(vec![3, 4]))
        );
        assert_eq!(
            run(
                DefaultFunction::SliceByteString,
                vec![Constant::integer(-3), Constant::integer(2), data]
            ),
            Ok(Constant::ByteString(vec![1, 2]))
        );
    }

    #[test]
    fn test_unconstr_data() {
        let d = PlutusData::Constr(3, vec![PlutusData::integer(1)]);
        let pair = run(DefaultFunction::UnConstrData, vec![Constant::Data(d)]).unwrap();
        match pair {
            Constant::ProtoPair(_, _, tag, fields) => {
                assert_eq!(*tag, Constant::integer(3));
                assert_eq!(*fields, Constant::data_list(vec![PlutusData::integer(1)]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_head_of_empty_list() {
        assert_eq!(
            run(DefaultFunction::HeadList, vec![Constant::data_list(vec![])]),
            Err(MachineError::EmptyList(DefaultFunction::HeadList))
        );
    }

    #[test]
    fn test_unbdata_type_mismatch() {
        assert!(matches!(
            run(
                DefaultFunction::UnBData,
                vec![Constant::Data(PlutusData::integer(1))]
            ),
            Err(MachineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_mk_cons_checks_element_type() {
        let list = Constant::data_list(vec![]);
        assert!(run(DefaultFunction::MkCons, vec![Constant::integer(1), list.clone()]).is_err());
        assert_eq!(
            run(
                DefaultFunction::MkCons,
                vec![Constant::Data(PlutusData::integer(1)), list]
            ),
            Ok(Constant::data_list(vec![PlutusData::integer(1)]))
        );
    }

    #[test]
    fn test_serialise_data() {
        let out = run(
            DefaultFunction::SerialiseData,
            vec![Constant::Data(PlutusData::unit_constr(0))],
        );
        assert_eq!(out, Ok(Constant::ByteString(vec![0xd8, 0x79, 0x80])));
    }
}
