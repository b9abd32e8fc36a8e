//! Built-in validators
//!
//! The two reference scripts: one that accepts any spend, and a "gift" that
//! only its datum's key holder can unlock.

use crate::compiler::expr::{equals, exists, extract_field, make_unit, var};
use crate::compiler::{param, Type, ValidatorFunction};
use crate::script::ScriptType;

/// Names accepted by [`by_name`]
pub const VALIDATOR_NAMES: [&str; 2] = ["always-succeeds", "gift"];

/// Spending validator returning unit for any arguments
pub fn always_succeeds() -> ValidatorFunction {
    ValidatorFunction::spending(
        vec![
            param("datum", Type::Data),
            param("redeemer", Type::Data),
            param("ctx", Type::Data),
        ],
        Type::Unit,
        make_unit(),
    )
}

/// Spending validator that succeeds iff the datum's key hash signed the
/// transaction
pub fn gift(version: ScriptType) -> ValidatorFunction {
    let body = extract_field(
        var("ctx"),
        "txInfo",
        extract_field(
            var("txInfo"),
            "signatories",
            exists(var("signatories"), "signer", equals(var("signer"), var("owner"))),
        ),
    );
    ValidatorFunction::spending(
        vec![
            param("owner", Type::PubKeyHash),
            param("redeemer", Type::Data),
            param("ctx", Type::script_context(version)),
        ],
        Type::Boolean,
        body,
    )
}

pub fn by_name(name: &str, version: ScriptType) -> Option<ValidatorFunction> {
    match name {
        "always-succeeds" | "always_succeeds" => Some(always_succeeds()),
        "gift" => Some(gift(version)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::ledger::{ContextBuilder, Credential, PubKeyHash, TxOutRef};
    use crate::script::{wrap, ScriptEnvelope};
    use crate::uplc::data::PlutusData;
    use crate::uplc::machine::MachineError;

    fn random_key() -> PubKeyHash {
        PubKeyHash::new(rand::random::<[u8; 28]>())
    }

    fn spend_context(signers: &[PubKeyHash], version: ScriptType) -> PlutusData {
        let out_ref = TxOutRef::new([1u8; 32], 0);
        let builder = signers
            .iter()
            .fold(ContextBuilder::unsigned(), |b, s| b.with_signatory(*s));
        builder
            .with_input(out_ref, Credential::Script([5u8; 28]), 2_000_000, None)
            .build_spend(out_ref, version)
            .unwrap()
    }

    #[test]
    fn test_always_succeeds_artifact() {
        let envelope = wrap(compile(&always_succeeds()).unwrap(), ScriptType::PlutusV2);
        let json = envelope.to_json().unwrap();
        assert_eq!(json["type"], "PlutusScriptV2");
        assert_eq!(json["cborHex"], "4746010000222499");
        assert_eq!(
            envelope.program().program().to_string(),
            "(program 1.0.0 (lam i_0 (lam i_1 (lam i_2 (con unit ())))))"
        );
    }

    #[test]
    fn test_always_succeeds_ignores_arguments() {
        let envelope = wrap(compile(&always_succeeds()).unwrap(), ScriptType::PlutusV2);
        let ctx = spend_context(&[], ScriptType::PlutusV2);
        for datum in [PlutusData::integer(-1), PlutusData::Bytes(vec![0; 40])] {
            let result = envelope.evaluate(&[datum, PlutusData::unit_constr(0), ctx.clone()]);
            assert!(result.is_success());
        }
    }

    #[test]
    fn test_gift_requires_owner_signature() {
        for version in [ScriptType::PlutusV1, ScriptType::PlutusV2] {
            let envelope = wrap(compile(&gift(version)).unwrap(), version);
            let owner = random_key();
            let others: Vec<PubKeyHash> = (0..4).map(|_| random_key()).collect();

            let mut signers = others.clone();
            signers.insert(2, owner);
            let signed = envelope.evaluate(&[
                owner.to_data(),
                PlutusData::unit_constr(0),
                spend_context(&signers, version),
            ]);
            assert!(signed.is_success(), "{} signed: {:?}", version, signed.outcome);

            let unsigned = envelope.evaluate(&[
                owner.to_data(),
                PlutusData::unit_constr(0),
                spend_context(&others, version),
            ]);
            assert!(matches!(
                unsigned.outcome,
                Err(MachineError::EvaluationFailure)
            ));
        }
    }

    #[test]
    fn test_gift_with_no_signatories_fails() {
        let envelope = wrap(compile(&gift(ScriptType::PlutusV2)).unwrap(), ScriptType::PlutusV2);
        let result = envelope.evaluate(&[
            random_key().to_data(),
            PlutusData::unit_constr(0),
            spend_context(&[], ScriptType::PlutusV2),
        ]);
        assert!(!result.is_success());
    }

    #[test]
    fn test_gift_layout_differs_between_versions() {
        let v1 = compile(&gift(ScriptType::PlutusV1)).unwrap();
        let v2 = compile(&gift(ScriptType::PlutusV2)).unwrap();
        assert_ne!(v1.flat_bytes(), v2.flat_bytes());
    }

    #[test]
    fn test_gift_binary_roundtrip() {
        for version in [ScriptType::PlutusV1, ScriptType::PlutusV2] {
            let compiled = compile(&gift(version)).unwrap();
            let envelope = wrap(compiled.clone(), version);
            let decoded = ScriptEnvelope::from_cbor_hex(&envelope.to_cbor_hex(), version).unwrap();
            assert_eq!(decoded.program().program(), compiled.program());
            assert_eq!(decoded.to_binary(), envelope.to_binary());
        }
    }

    #[test]
    fn test_by_name() {
        for name in VALIDATOR_NAMES {
            assert!(by_name(name, ScriptType::PlutusV2).is_some());
        }
        assert!(by_name("vesting", ScriptType::PlutusV2).is_none());
    }
}
