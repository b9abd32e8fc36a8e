//! Versioned script envelopes
//!
//! A compiled program tagged with the ledger language it targets. The
//! binary form is the flat program wrapped twice as a CBOR byte string, the
//! layout `.plutus` text envelopes carry in `cborHex`.

use crate::codec::cbor::{decode_bytes, encode_bytes};
use crate::compiler::CompiledProgram;
use crate::crypto::hash::{blake2b_224, blake2b_224_hex, HASH_224_SIZE};
use crate::ledger::{address, Network};
use crate::script::error::ScriptError;
use crate::uplc::data::PlutusData;
use crate::uplc::machine::{self, EvalResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Script type
// =============================================================================

/// Ledger language a script is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScriptType {
    PlutusV1,
    #[default]
    PlutusV2,
    PlutusV3,
}

impl ScriptType {
    /// `type` field of a text envelope
    pub fn envelope_type(&self) -> &'static str {
        match self {
            ScriptType::PlutusV1 => "PlutusScriptV1",
            ScriptType::PlutusV2 => "PlutusScriptV2",
            ScriptType::PlutusV3 => "PlutusScriptV3",
        }
    }

    /// Prefix byte of the script hash preimage
    pub fn language_tag(&self) -> u8 {
        match self {
            ScriptType::PlutusV1 => 1,
            ScriptType::PlutusV2 => 2,
            ScriptType::PlutusV3 => 3,
        }
    }

    pub fn from_envelope_type(s: &str) -> Option<Self> {
        match s {
            "PlutusScriptV1" => Some(ScriptType::PlutusV1),
            "PlutusScriptV2" => Some(ScriptType::PlutusV2),
            "PlutusScriptV3" => Some(ScriptType::PlutusV3),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope_type())
    }
}

impl FromStr for ScriptType {
    type Err = ScriptError;

    /// Accepts `v2`, `plutusv2`, `PlutusV2` and `PlutusScriptV2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(t) = Self::from_envelope_type(s) {
            return Ok(t);
        }
        match s.to_ascii_lowercase().as_str() {
            "v1" | "plutusv1" => Ok(ScriptType::PlutusV1),
            "v2" | "plutusv2" => Ok(ScriptType::PlutusV2),
            "v3" | "plutusv3" => Ok(ScriptType::PlutusV3),
            _ => Err(ScriptError::UnknownScriptType(s.to_string())),
        }
    }
}

// =============================================================================
// Text envelope
// =============================================================================

/// JSON shape of a `.plutus` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEnvelope {
    #[serde(rename = "type")]
    pub script_type: String,
    #[serde(default)]
    pub description: String,
    pub cbor_hex: String,
}

// =============================================================================
// Envelope
// =============================================================================

/// A compiled program tagged with its script type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEnvelope {
    script_type: ScriptType,
    description: String,
    program: CompiledProgram,
}

/// Tag a compiled program with the language it targets
pub fn wrap(program: CompiledProgram, script_type: ScriptType) -> ScriptEnvelope {
    ScriptEnvelope::new(program, script_type)
}

impl ScriptEnvelope {
    pub fn new(program: CompiledProgram, script_type: ScriptType) -> Self {
        Self {
            script_type,
            description: String::new(),
            program,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    /// Flat program wrapped once; the form the ledger hashes
    pub fn script_bytes(&self) -> Vec<u8> {
        encode_bytes(self.program.flat_bytes())
    }

    /// Canonical binary form: flat program wrapped twice
    pub fn to_binary(&self) -> Vec<u8> {
        encode_bytes(&self.script_bytes())
    }

    pub fn to_cbor_hex(&self) -> String {
        hex::encode(self.to_binary())
    }

    pub fn to_text_envelope(&self) -> TextEnvelope {
        TextEnvelope {
            script_type: self.script_type.envelope_type().to_string(),
            description: self.description.clone(),
            cbor_hex: self.to_cbor_hex(),
        }
    }

    /// `{ "type", "description", "cborHex" }`
    pub fn to_json(&self) -> Result<serde_json::Value, ScriptError> {
        Ok(serde_json::to_value(self.to_text_envelope())?)
    }

    /// Pretty JSON text in envelope field order
    pub fn to_json_string(&self) -> Result<String, ScriptError> {
        Ok(serde_json::to_string_pretty(&self.to_text_envelope())?)
    }

    pub fn from_text_envelope(envelope: &TextEnvelope) -> Result<Self, ScriptError> {
        let script_type = ScriptType::from_envelope_type(&envelope.script_type)
            .ok_or_else(|| ScriptError::UnknownScriptType(envelope.script_type.clone()))?;
        Ok(Self::from_cbor_hex(&envelope.cbor_hex, script_type)?
            .with_description(&envelope.description))
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, ScriptError> {
        let envelope: TextEnvelope = serde_json::from_value(value.clone())?;
        Self::from_text_envelope(&envelope)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ScriptError> {
        let envelope: TextEnvelope = serde_json::from_str(text)?;
        Self::from_text_envelope(&envelope)
    }

    /// Decode hex holding the program wrapped once or twice
    pub fn from_cbor_hex(cbor_hex: &str, script_type: ScriptType) -> Result<Self, ScriptError> {
        let bytes = hex::decode(cbor_hex.trim())?;
        let program = unwrap_program(&bytes)?;
        Ok(Self::new(program, script_type))
    }

    /// Script hash: BLAKE2b-224 of the language tag and the wrapped script
    pub fn hash(&self) -> [u8; HASH_224_SIZE] {
        blake2b_224(&self.hash_preimage())
    }

    pub fn hash_hex(&self) -> String {
        blake2b_224_hex(&self.hash_preimage())
    }

    fn hash_preimage(&self) -> Vec<u8> {
        let mut preimage = vec![self.script_type.language_tag()];
        preimage.extend_from_slice(&self.script_bytes());
        preimage
    }

    /// Enterprise address paying to this script
    pub fn address(&self, network: Network) -> Result<String, ScriptError> {
        Ok(address::script_address(&self.hash(), network)?)
    }

    /// Apply data arguments and run the program with the default budget
    pub fn evaluate(&self, args: &[PlutusData]) -> EvalResult {
        machine::eval(&self.program.program().apply_data(args))
    }
}

/// Strip one or two CBOR byte-string layers down to a flat program
pub(crate) fn unwrap_program(bytes: &[u8]) -> Result<CompiledProgram, ScriptError> {
    let outer = decode_bytes(bytes)?;
    if let Ok(inner) = decode_bytes(&outer) {
        if let Ok(program) = CompiledProgram::from_flat(&inner) {
            return Ok(program);
        }
    }
    log::warn!("Script is wrapped once; expected a double-wrapped cborHex");
    Ok(CompiledProgram::from_flat(&outer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uplc::term::{Program, Term};

    const ALWAYS_SUCCEEDS_HEX: &str = "4746010000222499";

    fn always_succeeds() -> CompiledProgram {
        CompiledProgram::new(Program::new(Term::lambda(Term::lambda(Term::lambda(
            Term::unit(),
        )))))
    }

    #[test]
    fn test_always_succeeds_envelope() {
        let envelope = wrap(always_succeeds(), ScriptType::PlutusV2);
        assert_eq!(envelope.to_cbor_hex(), ALWAYS_SUCCEEDS_HEX);

        let json = envelope.to_json().unwrap();
        assert_eq!(json["type"], "PlutusScriptV2");
        assert_eq!(json["description"], "");
        assert_eq!(json["cborHex"], ALWAYS_SUCCEEDS_HEX);
    }

    #[test]
    fn test_json_and_binary_agree() {
        let envelope = wrap(always_succeeds(), ScriptType::PlutusV1).with_description("demo");
        let json = envelope.to_json().unwrap();
        let cbor_hex = json["cborHex"].as_str().unwrap();
        assert_eq!(hex::decode(cbor_hex).unwrap(), envelope.to_binary());
    }

    #[test]
    fn test_json_field_order() {
        let text = wrap(always_succeeds(), ScriptType::PlutusV2)
            .to_json_string()
            .unwrap();
        let type_at = text.find("\"type\"").unwrap();
        let description_at = text.find("\"description\"").unwrap();
        let cbor_at = text.find("\"cborHex\"").unwrap();
        assert!(type_at < description_at && description_at < cbor_at);
    }

    #[test]
    fn test_json_roundtrip() {
        let envelope = wrap(always_succeeds(), ScriptType::PlutusV3).with_description("x");
        let parsed = ScriptEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_single_wrapped_hex_accepted() {
        let single = ScriptEnvelope::from_cbor_hex("46010000222499", ScriptType::PlutusV2).unwrap();
        assert_eq!(single.to_cbor_hex(), ALWAYS_SUCCEEDS_HEX);
    }

    #[test]
    fn test_bad_inputs() {
        assert!(matches!(
            ScriptEnvelope::from_cbor_hex("zz", ScriptType::PlutusV2),
            Err(ScriptError::Hex(_))
        ));
        assert!(ScriptEnvelope::from_cbor_hex("4201ff", ScriptType::PlutusV2).is_err());
        assert!(matches!(
            ScriptEnvelope::from_json_str(
                r#"{"type":"PlutusScriptV9","description":"","cborHex":"4746010000222499"}"#
            ),
            Err(ScriptError::UnknownScriptType(_))
        ));
    }

    #[test]
    fn test_oversized_length_is_an_error() {
        assert!(matches!(
            ScriptEnvelope::from_cbor_hex("5bffffffffffffffff", ScriptType::PlutusV2),
            Err(ScriptError::Cbor(_))
        ));
    }

    #[test]
    fn test_deeply_nested_program_is_an_error() {
        let mut flat = vec![0x01, 0x00, 0x00];
        flat.extend(std::iter::repeat(0x11).take(100_000));
        flat.push(0x61);
        let cbor_hex = hex::encode(encode_bytes(&encode_bytes(&flat)));
        assert!(matches!(
            ScriptEnvelope::from_cbor_hex(&cbor_hex, ScriptType::PlutusV2),
            Err(ScriptError::Flat(_))
        ));
    }

    #[test]
    fn test_hash_depends_on_language() {
        let v1 = wrap(always_succeeds(), ScriptType::PlutusV1);
        let v2 = wrap(always_succeeds(), ScriptType::PlutusV2);
        assert_eq!(
            v2.hash_hex(),
            "52c6af0c9b744b4eecce838538a52ceb155038b3de68e2bb2fa8fc37"
        );
        assert_eq!(
            v1.hash_hex(),
            "fc61e623d413aa67dc9367e8e48f5ab7f38093e871af6d9dd27b717e"
        );
    }

    #[test]
    fn test_script_address() {
        let envelope = wrap(always_succeeds(), ScriptType::PlutusV2);
        assert_eq!(
            envelope.address(Network::Testnet).unwrap(),
            "addr_test1wpfvdtcvnd6yknhve6pc2w999n4325pck00x3c4m9750cdch6csfq"
        );
        assert_eq!(
            envelope.address(Network::Mainnet).unwrap(),
            "addr1w9fvdtcvnd6yknhve6pc2w999n4325pck00x3c4m9750cdcvjvvx9"
        );
    }

    #[test]
    fn test_script_type_parsing() {
        assert_eq!("v1".parse::<ScriptType>().unwrap(), ScriptType::PlutusV1);
        assert_eq!(
            "PlutusScriptV3".parse::<ScriptType>().unwrap(),
            ScriptType::PlutusV3
        );
        assert!("v4".parse::<ScriptType>().is_err());
    }

    #[test]
    fn test_evaluate_ignores_arguments() {
        let envelope = wrap(always_succeeds(), ScriptType::PlutusV2);
        let args = [
            PlutusData::integer(7),
            PlutusData::Bytes(vec![1, 2, 3]),
            PlutusData::unit_constr(0),
        ];
        let result = envelope.evaluate(&args);
        assert!(result.is_success());
        assert_eq!(result.outcome.unwrap(), Term::unit());
    }
}
