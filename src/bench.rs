//! Validator benchmarks
//!
//! Runs a script against the canned spending scenarios of a known validator
//! and reports size and execution cost, one CSV row per scenario:
//! `purpose,outcome,size,cpu,mem`.

use crate::ledger::{payment_key_hash, ContextBuilder, ContextError, Credential, TxOutRef};
use crate::script::ScriptEnvelope;
use crate::uplc::data::PlutusData;
use std::fmt;
use thiserror::Error;

/// Key holder the gift is addressed to
pub const OWNER_ADDRESS: &str = "addr_test1qpmtp5t0t5y6cqkaz7rfsyrx7mld77kpvksgkwm0p7en7qum7a589n30e80tclzrrnj8qr4qvzj6al0vpgtnmrkkksnqd8upj0";
/// Someone else
pub const OTHER_ADDRESS: &str = "addr_test1qpy5a8ea64dz7p28hxzdwq7fltrghgant84j6gw3asam5hvx23v86j6cdz5fps95xxxhdtdprd45sfx0ta6sa4ykmsvsucxzk6";

const LOCKED_LOVELACE: u64 = 2_000_000;

/// Benchmark errors
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("No benchmark scenarios for validator '{0}'")]
    UnknownValidator(String),
    #[error("Context error: {0}")]
    Context(#[from] ContextError),
}

/// One measured scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchResult {
    pub purpose: &'static str,
    /// Whether the script accepted the transaction
    pub passed: bool,
    /// Size of the wrapped script in bytes
    pub size: usize,
    pub cpu: i64,
    pub mem: i64,
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.passed { "pass" } else { "fail" };
        write!(
            f,
            "{},{},{},{},{}",
            self.purpose, outcome, self.size, self.cpu, self.mem
        )
    }
}

/// Run every scenario defined for `validator`
pub fn run(envelope: &ScriptEnvelope, validator: &str) -> Result<Vec<BenchResult>, BenchError> {
    let owner = payment_key_hash(OWNER_ADDRESS)?;
    let other = payment_key_hash(OTHER_ADDRESS)?;

    let datums = match validator {
        "always-succeeds" | "always_succeeds" => vec![PlutusData::unit_constr(0)],
        "gift" => vec![owner.to_data(), other.to_data()],
        _ => return Err(BenchError::UnknownValidator(validator.to_string())),
    };

    let out_ref = TxOutRef::new([1u8; 32], 0);
    let script = Credential::Script(envelope.hash());
    let size = envelope.script_bytes().len();

    datums
        .into_iter()
        .map(|datum| {
            let ctx = ContextBuilder::new(owner)
                .with_input(out_ref, script, LOCKED_LOVELACE, Some(datum.clone()))
                .build_spend(out_ref, envelope.script_type())?;
            let result = envelope.evaluate(&[datum, PlutusData::unit_constr(0), ctx]);
            log::debug!("Bench scenario finished: {:?}", result.outcome);
            Ok(BenchResult {
                purpose: "spend",
                passed: result.is_success(),
                size,
                cpu: result.consumed.cpu,
                mem: result.consumed.mem,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::script::{wrap, ScriptType};
    use crate::validators;

    #[test]
    fn test_gift_scenarios() {
        let envelope = wrap(
            compile(&validators::gift(ScriptType::PlutusV2)).unwrap(),
            ScriptType::PlutusV2,
        );
        let results = run(&envelope, "gift").unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(results[0].cpu > 0 && results[0].mem > 0);
    }

    #[test]
    fn test_always_succeeds_row() {
        let envelope = wrap(
            compile(&validators::always_succeeds()).unwrap(),
            ScriptType::PlutusV2,
        );
        let results = run(&envelope, "always-succeeds").unwrap();
        assert_eq!(results.len(), 1);
        let row = results[0].to_string();
        assert!(row.starts_with("spend,pass,7,"), "{}", row);
    }

    #[test]
    fn test_unknown_validator() {
        let envelope = wrap(
            compile(&validators::always_succeeds()).unwrap(),
            ScriptType::PlutusV2,
        );
        assert!(matches!(
            run(&envelope, "vesting"),
            Err(BenchError::UnknownValidator(_))
        ));
    }
}
