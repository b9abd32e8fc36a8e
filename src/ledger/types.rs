//! Ledger primitives
//!
//! Key hashes, output references, credentials and networks, with their
//! Plutus data encodings.

use crate::crypto::hash::{blake2b_224, HASH_224_SIZE};
use crate::uplc::data::PlutusData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of a transaction id in bytes
pub const TX_ID_SIZE: usize = 32;

// =============================================================================
// Errors
// =============================================================================

/// Ledger and context errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Invalid hash length: expected {expected} bytes, got {found}")]
    InvalidHashLength { expected: usize, found: usize },
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Address has no payment key hash")]
    NoPaymentKey,
    #[error("Script contexts for {0} are not supported")]
    UnsupportedVersion(String),
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

// =============================================================================
// Hashes
// =============================================================================

/// BLAKE2b-224 hash of a payment verification key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PubKeyHash([u8; HASH_224_SIZE]);

impl PubKeyHash {
    pub fn new(bytes: [u8; HASH_224_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build from a slice that must be exactly 28 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ContextError> {
        let array: [u8; HASH_224_SIZE] =
            bytes
                .try_into()
                .map_err(|_| ContextError::InvalidHashLength {
                    expected: HASH_224_SIZE,
                    found: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parse from a 56-character hex string
    pub fn from_hex(s: &str) -> Result<Self, ContextError> {
        let bytes = hex::decode(s.trim()).map_err(|e| ContextError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Hash a verification key
    pub fn from_verification_key(key: &[u8]) -> Self {
        Self(blake2b_224(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Plutus data form: a plain byte string
    pub fn to_data(&self) -> PlutusData {
        PlutusData::Bytes(self.0.to_vec())
    }
}

impl fmt::Display for PubKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PubKeyHash {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// =============================================================================
// Output references and credentials
// =============================================================================

/// Reference to a transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxOutRef {
    pub tx_id: [u8; TX_ID_SIZE],
    pub index: u64,
}

impl TxOutRef {
    pub fn new(tx_id: [u8; TX_ID_SIZE], index: u64) -> Self {
        Self { tx_id, index }
    }

    /// `TxOutRef { txOutRefId = TxId id, txOutRefIdx = index }`
    pub fn to_data(&self) -> PlutusData {
        PlutusData::Constr(
            0,
            vec![
                PlutusData::Constr(0, vec![PlutusData::Bytes(self.tx_id.to_vec())]),
                PlutusData::integer(self.index),
            ],
        )
    }
}

/// Payment credential of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    PubKey(PubKeyHash),
    Script([u8; HASH_224_SIZE]),
}

impl Credential {
    pub fn to_data(&self) -> PlutusData {
        match self {
            Credential::PubKey(pkh) => PlutusData::Constr(0, vec![pkh.to_data()]),
            Credential::Script(hash) => PlutusData::Constr(1, vec![PlutusData::Bytes(hash.to_vec())]),
        }
    }

    /// Address data with no staking part
    pub fn to_address_data(&self) -> PlutusData {
        PlutusData::Constr(0, vec![self.to_data(), PlutusData::unit_constr(1)])
    }
}

// =============================================================================
// Networks
// =============================================================================

/// Network an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    /// Network id carried in the low nibble of the address header
    pub fn id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Testnet => 0,
        }
    }

    /// Bech32 human-readable prefix for addresses
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Testnet => "addr_test",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" | "preprod" | "preview" => Ok(Network::Testnet),
            _ => Err(ContextError::UnknownNetwork(s.to_string())),
        }
    }
}
