//! Plutus Core builtin functions
//!
//! The builtin set shared by Plutus V1 and V2 scripts, with the flat tag,
//! arity and number of type instantiations (forces) of each.

use std::fmt;

/// Builtin functions of the untyped Plutus Core machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DefaultFunction {
    // Integers
    AddInteger = 0,
    SubtractInteger = 1,
    MultiplyInteger = 2,
    DivideInteger = 3,
    QuotientInteger = 4,
    RemainderInteger = 5,
    ModInteger = 6,
    EqualsInteger = 7,
    LessThanInteger = 8,
    LessThanEqualsInteger = 9,

    // Byte strings
    AppendByteString = 10,
    ConsByteString = 11,
    SliceByteString = 12,
    LengthOfByteString = 13,
    IndexByteString = 14,
    EqualsByteString = 15,
    LessThanByteString = 16,
    LessThanEqualsByteString = 17,

    // Cryptography
    Sha2_256 = 18,
    Sha3_256 = 19,
    Blake2b256 = 20,
    VerifyEd25519Signature = 21,

    // Strings
    AppendString = 22,
    EqualsString = 23,
    EncodeUtf8 = 24,
    DecodeUtf8 = 25,

    // Polymorphic control
    IfThenElse = 26,
    ChooseUnit = 27,
    Trace = 28,

    // Pairs
    FstPair = 29,
    SndPair = 30,

    // Lists
    ChooseList = 31,
    MkCons = 32,
    HeadList = 33,
    TailList = 34,
    NullList = 35,

    // Data
    ChooseData = 36,
    ConstrData = 37,
    MapData = 38,
    ListData = 39,
    IData = 40,
    BData = 41,
    UnConstrData = 42,
    UnMapData = 43,
    UnListData = 44,
    UnIData = 45,
    UnBData = 46,
    EqualsData = 47,
    MkPairData = 48,
    MkNilData = 49,
    MkNilPairData = 50,
    SerialiseData = 51,

    // Signatures (Plutus V2)
    VerifyEcdsaSecp256k1Signature = 52,
    VerifySchnorrSecp256k1Signature = 53,
}

impl DefaultFunction {
    /// Every builtin, in tag order
    pub const ALL: [DefaultFunction; 54] = [
        DefaultFunction::AddInteger,
        DefaultFunction::SubtractInteger,
        DefaultFunction::MultiplyInteger,
        DefaultFunction::DivideInteger,
        DefaultFunction::QuotientInteger,
        DefaultFunction::RemainderInteger,
        DefaultFunction::ModInteger,
        DefaultFunction::EqualsInteger,
        DefaultFunction::LessThanInteger,
        DefaultFunction::LessThanEqualsInteger,
        DefaultFunction::AppendByteString,
        DefaultFunction::ConsByteString,
        DefaultFunction::SliceByteString,
        DefaultFunction::LengthOfByteString,
        DefaultFunction::IndexByteString,
        DefaultFunction::EqualsByteString,
        DefaultFunction::LessThanByteString,
        DefaultFunction::LessThanEqualsByteString,
        DefaultFunction::Sha2_256,
        DefaultFunction::Sha3_256,
        DefaultFunction::Blake2b256,
        DefaultFunction::VerifyEd25519Signature,
        DefaultFunction::AppendString,
        DefaultFunction::EqualsString,
        DefaultFunction::EncodeUtf8,
        DefaultFunction::DecodeUtf8,
        DefaultFunction::IfThenElse,
        DefaultFunction::ChooseUnit,
        DefaultFunction::Trace,
        DefaultFunction::FstPair,
        DefaultFunction::SndPair,
        DefaultFunction::ChooseList,
        DefaultFunction::MkCons,
        DefaultFunction::HeadList,
        DefaultFunction::TailList,
        DefaultFunction::NullList,
        DefaultFunction::ChooseData,
        DefaultFunction::ConstrData,
        DefaultFunction::MapData,
        DefaultFunction::ListData,
        DefaultFunction::IData,
        DefaultFunction::BData,
        DefaultFunction::UnConstrData,
        DefaultFunction::UnMapData,
        DefaultFunction::UnListData,
        DefaultFunction::UnIData,
        DefaultFunction::UnBData,
        DefaultFunction::EqualsData,
        DefaultFunction::MkPairData,
        DefaultFunction::MkNilData,
        DefaultFunction::MkNilPairData,
        DefaultFunction::SerialiseData,
        DefaultFunction::VerifyEcdsaSecp256k1Signature,
        DefaultFunction::VerifySchnorrSecp256k1Signature,
    ];

    /// Convert a flat tag to a builtin
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// The 7-bit flat tag
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Look up a builtin by its Plutus Core name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Number of term arguments the builtin consumes
    pub fn arity(&self) -> usize {
        match self {
            DefaultFunction::LengthOfByteString
            | DefaultFunction::Sha2_256
            | DefaultFunction::Sha3_256
            | DefaultFunction::Blake2b256
            | DefaultFunction::EncodeUtf8
            | DefaultFunction::DecodeUtf8
            | DefaultFunction::FstPair
            | DefaultFunction::SndPair
            | DefaultFunction::HeadList
            | DefaultFunction::TailList
            | DefaultFunction::NullList
            | DefaultFunction::MapData
            | DefaultFunction::ListData
            | DefaultFunction::IData
            | DefaultFunction::BData
            | DefaultFunction::UnConstrData
            | DefaultFunction::UnMapData
            | DefaultFunction::UnListData
            | DefaultFunction::UnIData
            | DefaultFunction::UnBData
            | DefaultFunction::MkNilData
            | DefaultFunction::MkNilPairData
            | DefaultFunction::SerialiseData => 1,
            DefaultFunction::SliceByteString
            | DefaultFunction::VerifyEd25519Signature
            | DefaultFunction::IfThenElse
            | DefaultFunction::ChooseList
            | DefaultFunction::VerifyEcdsaSecp256k1Signature
            | DefaultFunction::VerifySchnorrSecp256k1Signature => 3,
            DefaultFunction::ChooseData => 6,
            _ => 2,
        }
    }

    /// Number of `force`s needed before the builtin accepts arguments
    pub fn force_count(&self) -> usize {
        match self {
            DefaultFunction::FstPair
            | DefaultFunction::SndPair
            | DefaultFunction::ChooseList => 2,
            DefaultFunction::IfThenElse
            | DefaultFunction::ChooseUnit
            | DefaultFunction::Trace
            | DefaultFunction::MkCons
            | DefaultFunction::HeadList
            | DefaultFunction::TailList
            | DefaultFunction::NullList
            | DefaultFunction::ChooseData => 1,
            _ => 0,
        }
    }

    /// Plutus Core name, as used by the textual syntax
    pub fn name(&self) -> &'static str {
        match self {
            DefaultFunction::AddInteger => "addInteger",
            DefaultFunction::SubtractInteger => "subtractInteger",
            DefaultFunction::MultiplyInteger => "multiplyInteger",
            DefaultFunction::DivideInteger => "divideInteger",
            DefaultFunction::QuotientInteger => "quotientInteger",
            DefaultFunction::RemainderInteger => "remainderInteger",
            DefaultFunction::ModInteger => "modInteger",
            DefaultFunction::EqualsInteger => "equalsInteger",
            DefaultFunction::LessThanInteger => "lessThanInteger",
            DefaultFunction::LessThanEqualsInteger => "lessThanEqualsInteger",
            DefaultFunction::AppendByteString => "appendByteString",
            DefaultFunction::ConsByteString => "consByteString",
            DefaultFunction::SliceByteString => "sliceByteString",
            DefaultFunction::LengthOfByteString => "lengthOfByteString",
            DefaultFunction::IndexByteString => "indexByteString",
            DefaultFunction::EqualsByteString => "equalsByteString",
            DefaultFunction::LessThanByteString => "lessThanByteString",
            DefaultFunction::LessThanEqualsByteString => "lessThanEqualsByteString",
            DefaultFunction::Sha2_256 => "sha2_256",
            DefaultFunction::Sha3_256 => "sha3_256",
            DefaultFunction::Blake2b256 => "blake2b_256",
            DefaultFunction::VerifyEd25519Signature => "verifyEd25519Signature",
            DefaultFunction::AppendString => "appendString",
            DefaultFunction::EqualsString => "equalsString",
            DefaultFunction::EncodeUtf8 => "encodeUtf8",
            DefaultFunction::DecodeUtf8 => "decodeUtf8",
            DefaultFunction::IfThenElse => "ifThenElse",
            DefaultFunction::ChooseUnit => "chooseUnit",
            DefaultFunction::Trace => "trace",
            DefaultFunction::FstPair => "fstPair",
            DefaultFunction::SndPair => "sndPair",
            DefaultFunction::ChooseList => "chooseList",
            DefaultFunction::MkCons => "mkCons",
            DefaultFunction::HeadList => "headList",
            DefaultFunction::TailList => "tailList",
            DefaultFunction::NullList => "nullList",
            DefaultFunction::ChooseData => "chooseData",
            DefaultFunction::ConstrData => "constrData",
            DefaultFunction::MapData => "mapData",
            DefaultFunction::ListData => "listData",
            DefaultFunction::IData => "iData",
            DefaultFunction::BData => "bData",
            DefaultFunction::UnConstrData => "unConstrData",
            DefaultFunction::UnMapData => "unMapData",
            DefaultFunction::UnListData => "unListData",
            DefaultFunction::UnIData => "unIData",
            DefaultFunction::UnBData => "unBData",
            DefaultFunction::EqualsData => "equalsData",
            DefaultFunction::MkPairData => "mkPairData",
            DefaultFunction::MkNilData => "mkNilData",
            DefaultFunction::MkNilPairData => "mkNilPairData",
            DefaultFunction::SerialiseData => "serialiseData",
            DefaultFunction::VerifyEcdsaSecp256k1Signature => "verifyEcdsaSecp256k1Signature",
            DefaultFunction::VerifySchnorrSecp256k1Signature => "verifySchnorrSecp256k1Signature",
        }
    }
}

impl fmt::Display for DefaultFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
