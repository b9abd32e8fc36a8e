//! Source-level types
//!
//! Every value reaches a validator as Plutus data; the type of a name
//! decides how that data is decoded where the name is used.

use crate::script::ScriptType;
use std::fmt;

/// Type of a validator-language value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Opaque Plutus data
    Data,
    Boolean,
    Unit,
    Integer,
    ByteString,
    PubKeyHash,
    /// List whose elements arrive as data
    List(Box<Type>),
    /// Constructor-encoded record with named fields
    Record(RecordType),
}

/// Named field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Record layout: `Constr constructor [field0, field1, ...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    pub name: String,
    pub constructor: u64,
    pub fields: Vec<Field>,
}

impl RecordType {
    pub fn new(name: &str, fields: Vec<(&str, Type)>) -> Self {
        Self {
            name: name.to_string(),
            constructor: 0,
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    /// Position and declaration of a field
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    /// `ScriptContext` record for a ledger version
    pub fn script_context(version: ScriptType) -> Self {
        let fields = match version {
            ScriptType::PlutusV1 | ScriptType::PlutusV2 => vec![
                ("txInfo", Type::tx_info(version)),
                ("purpose", Type::Data),
            ],
            ScriptType::PlutusV3 => vec![
                ("txInfo", Type::tx_info(version)),
                ("redeemer", Type::Data),
                ("scriptInfo", Type::Data),
            ],
        };
        Type::Record(RecordType::new("ScriptContext", fields))
    }

    /// `TxInfo` record for a ledger version
    pub fn tx_info(version: ScriptType) -> Self {
        let data_list = || Type::list(Type::Data);
        let signatories = Type::list(Type::PubKeyHash);
        let fields = match version {
            ScriptType::PlutusV1 => vec![
                ("inputs", data_list()),
                ("outputs", data_list()),
                ("fee", Type::Data),
                ("mint", Type::Data),
                ("dcert", data_list()),
                ("wdrl", data_list()),
                ("validRange", Type::Data),
                ("signatories", signatories),
                ("data", data_list()),
                ("id", Type::Data),
            ],
            ScriptType::PlutusV2 => vec![
                ("inputs", data_list()),
                ("referenceInputs", data_list()),
                ("outputs", data_list()),
                ("fee", Type::Data),
                ("mint", Type::Data),
                ("dcert", data_list()),
                ("wdrl", Type::Data),
                ("validRange", Type::Data),
                ("signatories", signatories),
                ("redeemers", Type::Data),
                ("data", Type::Data),
                ("id", Type::Data),
            ],
            ScriptType::PlutusV3 => vec![
                ("inputs", data_list()),
                ("referenceInputs", data_list()),
                ("outputs", data_list()),
                ("fee", Type::Integer),
                ("mint", Type::Data),
                ("txCerts", data_list()),
                ("wdrl", Type::Data),
                ("validRange", Type::Data),
                ("signatories", signatories),
                ("redeemers", Type::Data),
                ("data", Type::Data),
                ("id", Type::Data),
                ("votes", Type::Data),
                ("proposalProcedures", data_list()),
                ("currentTreasuryAmount", Type::Data),
                ("treasuryDonation", Type::Data),
            ],
        };
        Type::Record(RecordType::new("TxInfo", fields))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Data => write!(f, "Data"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Unit => write!(f, "Unit"),
            Type::Integer => write!(f, "Integer"),
            Type::ByteString => write!(f, "ByteString"),
            Type::PubKeyHash => write!(f, "PubKeyHash"),
            Type::List(elem) => write!(f, "List<{}>", elem),
            Type::Record(record) => write!(f, "{}", record.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ty: Type) -> RecordType {
        match ty {
            Type::Record(r) => r,
            other => panic!("expected record, got {}", other),
        }
    }

    #[test]
    fn test_signatories_position_per_version() {
        let v1 = record(Type::tx_info(ScriptType::PlutusV1));
        let v2 = record(Type::tx_info(ScriptType::PlutusV2));
        let v3 = record(Type::tx_info(ScriptType::PlutusV3));
        assert_eq!(v1.field("signatories").map(|(i, _)| i), Some(7));
        assert_eq!(v2.field("signatories").map(|(i, _)| i), Some(8));
        assert_eq!(v3.field("signatories").map(|(i, _)| i), Some(8));
    }

    #[test]
    fn test_script_context_fields() {
        let v2 = record(Type::script_context(ScriptType::PlutusV2));
        assert_eq!(v2.fields.len(), 2);
        let v3 = record(Type::script_context(ScriptType::PlutusV3));
        assert_eq!(v3.field("scriptInfo").map(|(i, _)| i), Some(2));
        assert!(v3.field("purpose").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::list(Type::PubKeyHash).to_string(), "List<PubKeyHash>");
        assert_eq!(Type::script_context(ScriptType::PlutusV1).to_string(), "ScriptContext");
    }
}
