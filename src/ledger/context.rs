//! Script context construction
//!
//! Builds the `ScriptContext` data a validator receives as its last
//! argument, so compiled scripts can be evaluated locally.

use crate::crypto::hash::{blake2b_256, HASH_224_SIZE};
use crate::ledger::types::{ContextError, Credential, PubKeyHash, TxOutRef, TX_ID_SIZE};
use crate::script::ScriptType;
use crate::uplc::data::PlutusData;

/// A transaction output as seen by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub credential: Credential,
    pub lovelace: u64,
    /// Datum attached by hash
    pub datum: Option<PlutusData>,
}

/// A spent output together with its reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub out_ref: TxOutRef,
    pub output: TxOut,
}

/// Fluent builder for spending and minting contexts
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    signatories: Vec<PubKeyHash>,
    inputs: Vec<TxIn>,
    outputs: Vec<TxOut>,
    fee: u64,
    tx_id: [u8; TX_ID_SIZE],
}

impl ContextBuilder {
    /// Start a context signed by `signer`
    pub fn new(signer: PubKeyHash) -> Self {
        Self {
            signatories: vec![signer],
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee: 0,
            tx_id: [0u8; TX_ID_SIZE],
        }
    }

    /// Start a context nobody signed
    pub fn unsigned() -> Self {
        Self {
            signatories: Vec::new(),
            ..Self::new(PubKeyHash::new([0u8; HASH_224_SIZE]))
        }
    }

    pub fn with_signatory(mut self, signer: PubKeyHash) -> Self {
        self.signatories.push(signer);
        self
    }

    pub fn with_fee(mut self, lovelace: u64) -> Self {
        self.fee = lovelace;
        self
    }

    pub fn with_tx_id(mut self, tx_id: [u8; TX_ID_SIZE]) -> Self {
        self.tx_id = tx_id;
        self
    }

    pub fn with_input(
        mut self,
        out_ref: TxOutRef,
        credential: Credential,
        lovelace: u64,
        datum: Option<PlutusData>,
    ) -> Self {
        self.inputs.push(TxIn {
            out_ref,
            output: TxOut {
                credential,
                lovelace,
                datum,
            },
        });
        self
    }

    pub fn with_output(
        mut self,
        credential: Credential,
        lovelace: u64,
        datum: Option<PlutusData>,
    ) -> Self {
        self.outputs.push(TxOut {
            credential,
            lovelace,
            datum,
        });
        self
    }

    /// Context for spending `out_ref`
    pub fn build_spend(
        &self,
        out_ref: TxOutRef,
        version: ScriptType,
    ) -> Result<PlutusData, ContextError> {
        let purpose = PlutusData::Constr(1, vec![out_ref.to_data()]);
        self.build(purpose, version)
    }

    /// Context for minting under `policy_id`
    pub fn build_mint(
        &self,
        policy_id: [u8; HASH_224_SIZE],
        version: ScriptType,
    ) -> Result<PlutusData, ContextError> {
        let purpose = PlutusData::Constr(0, vec![PlutusData::Bytes(policy_id.to_vec())]);
        self.build(purpose, version)
    }

    fn build(&self, purpose: PlutusData, version: ScriptType) -> Result<PlutusData, ContextError> {
        let tx_info = match version {
            ScriptType::PlutusV1 => self.tx_info_v1(),
            ScriptType::PlutusV2 => self.tx_info_v2(),
            ScriptType::PlutusV3 => {
                return Err(ContextError::UnsupportedVersion(version.to_string()))
            }
        };
        log::debug!(
            "Built {} context: {} inputs, {} signatories",
            version,
            self.inputs.len(),
            self.signatories.len()
        );
        Ok(PlutusData::Constr(0, vec![tx_info, purpose]))
    }

    // =========================================================================
    // TxInfo layouts
    // =========================================================================

    fn tx_info_v1(&self) -> PlutusData {
        let inputs = self
            .inputs
            .iter()
            .map(|i| PlutusData::Constr(0, vec![i.out_ref.to_data(), tx_out_v1(&i.output)]))
            .collect();
        let outputs = self.outputs.iter().map(tx_out_v1).collect();
        let data = self
            .datums()
            .map(|d| PlutusData::Constr(0, vec![datum_hash(d), d.clone()]))
            .collect();

        PlutusData::Constr(
            0,
            vec![
                PlutusData::List(inputs),
                PlutusData::List(outputs),
                lovelace_value(self.fee),
                lovelace_value(0),
                PlutusData::List(Vec::new()),
                PlutusData::List(Vec::new()),
                always_interval(),
                self.signatories_data(),
                PlutusData::List(data),
                self.tx_id_data(),
            ],
        )
    }

    fn tx_info_v2(&self) -> PlutusData {
        let inputs = self
            .inputs
            .iter()
            .map(|i| PlutusData::Constr(0, vec![i.out_ref.to_data(), tx_out_v2(&i.output)]))
            .collect();
        let outputs = self.outputs.iter().map(tx_out_v2).collect();
        let data = self.datums().map(|d| (datum_hash(d), d.clone())).collect();

        PlutusData::Constr(
            0,
            vec![
                PlutusData::List(inputs),
                PlutusData::List(Vec::new()),
                PlutusData::List(outputs),
                lovelace_value(self.fee),
                lovelace_value(0),
                PlutusData::List(Vec::new()),
                PlutusData::Map(Vec::new()),
                always_interval(),
                self.signatories_data(),
                PlutusData::Map(Vec::new()),
                PlutusData::Map(data),
                self.tx_id_data(),
            ],
        )
    }

    fn datums(&self) -> impl Iterator<Item = &PlutusData> {
        self.inputs
            .iter()
            .map(|i| &i.output)
            .chain(self.outputs.iter())
            .filter_map(|o| o.datum.as_ref())
    }

    fn signatories_data(&self) -> PlutusData {
        PlutusData::List(self.signatories.iter().map(PubKeyHash::to_data).collect())
    }

    fn tx_id_data(&self) -> PlutusData {
        PlutusData::Constr(0, vec![PlutusData::Bytes(self.tx_id.to_vec())])
    }
}

/// `DatumHash` of a datum: BLAKE2b-256 of its CBOR
fn datum_hash(datum: &PlutusData) -> PlutusData {
    PlutusData::Bytes(blake2b_256(&datum.to_cbor()))
}

/// `Value` holding only lovelace
fn lovelace_value(amount: u64) -> PlutusData {
    let ada = PlutusData::Map(vec![(
        PlutusData::Bytes(Vec::new()),
        PlutusData::integer(amount),
    )]);
    PlutusData::Map(vec![(PlutusData::Bytes(Vec::new()), ada)])
}

/// `Interval` from negative to positive infinity, both closed
fn always_interval() -> PlutusData {
    let closed = PlutusData::unit_constr(1);
    let lower = PlutusData::Constr(0, vec![PlutusData::unit_constr(0), closed.clone()]);
    let upper = PlutusData::Constr(0, vec![PlutusData::unit_constr(2), closed]);
    PlutusData::Constr(0, vec![lower, upper])
}

fn tx_out_v1(output: &TxOut) -> PlutusData {
    let datum_hash = match &output.datum {
        Some(d) => PlutusData::Constr(0, vec![datum_hash(d)]),
        None => PlutusData::unit_constr(1),
    };
    PlutusData::Constr(
        0,
        vec![
            output.credential.to_address_data(),
            lovelace_value(output.lovelace),
            datum_hash,
        ],
    )
}

fn tx_out_v2(output: &TxOut) -> PlutusData {
    let datum = match &output.datum {
        Some(d) => PlutusData::Constr(1, vec![datum_hash(d)]),
        None => PlutusData::unit_constr(0),
    };
    PlutusData::Constr(
        0,
        vec![
            output.credential.to_address_data(),
            lovelace_value(output.lovelace),
            datum,
            PlutusData::unit_constr(1),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(data: &PlutusData) -> &[PlutusData] {
        match data {
            PlutusData::Constr(_, fields) => fields,
            other => panic!("expected constr, got {}", other),
        }
    }

    #[test]
    fn test_v2_spend_layout() {
        let signer = PubKeyHash::new([1u8; 28]);
        let out_ref = TxOutRef::new([9u8; 32], 0);
        let ctx = ContextBuilder::new(signer)
            .with_input(out_ref, Credential::Script([2u8; 28]), 2_000_000, Some(signer.to_data()))
            .build_spend(out_ref, ScriptType::PlutusV2)
            .unwrap();

        let ctx_fields = fields(&ctx);
        assert_eq!(ctx_fields.len(), 2);
        assert_eq!(ctx_fields[1], PlutusData::Constr(1, vec![out_ref.to_data()]));

        let info = fields(&ctx_fields[0]);
        assert_eq!(info.len(), 12);
        assert_eq!(info[8], PlutusData::List(vec![signer.to_data()]));
        match &info[10] {
            PlutusData::Map(entries) => assert_eq!(entries.len(), 1),
            other => panic!("expected datum map, got {}", other),
        }
    }

    #[test]
    fn test_v1_signatories_index() {
        let signer = PubKeyHash::new([3u8; 28]);
        let ctx = ContextBuilder::new(signer)
            .build_mint([4u8; 28], ScriptType::PlutusV1)
            .unwrap();
        let ctx_fields = fields(&ctx);
        let info = fields(&ctx_fields[0]);
        assert_eq!(info.len(), 10);
        assert_eq!(info[7], PlutusData::List(vec![signer.to_data()]));
        assert_eq!(
            ctx_fields[1],
            PlutusData::Constr(0, vec![PlutusData::Bytes(vec![4u8; 28])])
        );
    }

    #[test]
    fn test_unsigned_context() {
        let ctx = ContextBuilder::unsigned()
            .build_spend(TxOutRef::new([0u8; 32], 0), ScriptType::PlutusV2)
            .unwrap();
        let info = fields(&fields(&ctx)[0]);
        assert_eq!(info[8], PlutusData::List(Vec::new()));
    }

    #[test]
    fn test_v3_unsupported() {
        let result = ContextBuilder::unsigned()
            .build_spend(TxOutRef::new([0u8; 32], 0), ScriptType::PlutusV3);
        assert!(matches!(result, Err(ContextError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_always_interval_shape() {
        assert_eq!(
            always_interval().to_string(),
            "Constr 0 [Constr 0 [Constr 0 [], Constr 1 []], Constr 0 [Constr 2 [], Constr 1 []]]"
        );
    }
}
