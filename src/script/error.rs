//! Script envelope errors

use crate::codec::CborError;
use crate::ledger::ContextError;
use crate::uplc::FlatError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from decoding, loading or addressing scripts
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("Invalid CBOR: {0}")]
    Cbor(#[from] CborError),
    #[error("Invalid program: {0}")]
    Flat(#[from] FlatError),
    #[error("Address error: {0}")]
    Address(#[from] ContextError),
    #[error("Unknown script type: {0}")]
    UnknownScriptType(String),
    #[error("No script found at {0}")]
    NotFound(PathBuf),
}
