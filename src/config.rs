//! Build configuration
//!
//! Defaults for artifact generation, optionally read from a JSON file and
//! overridden by command-line flags.

use crate::ledger::Network;
use crate::script::ScriptType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Settings for building script artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Ledger language to target
    pub script_type: ScriptType,
    /// `description` written into envelopes
    pub description: String,
    /// Network used for script addresses
    pub network: Network,
    /// Directory for `build` output when no file is given
    pub output_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script_type: ScriptType::PlutusV2,
            description: String::new(),
            network: Network::Testnet,
            output_dir: PathBuf::from("build"),
        }
    }
}

impl BuildConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::debug!("Loaded build config from {}", path.display());
        Ok(config)
    }

    /// Path of the artifact for a validator
    pub fn artifact_path(&self, validator: &str) -> PathBuf {
        self.output_dir.join(validator).join("script.plutus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("build.json");
        fs::write(&path, r#"{ "scriptType": "PlutusV1", "network": "mainnet" }"#).unwrap();

        let config = BuildConfig::from_file(&path).unwrap();
        assert_eq!(config.script_type, ScriptType::PlutusV1);
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.output_dir, PathBuf::from("build"));
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("build.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BuildConfig::from_file(&path),
            Err(ConfigError::SerializationError(_))
        ));
    }

    #[test]
    fn test_artifact_path() {
        let config = BuildConfig::default();
        assert_eq!(
            config.artifact_path("gift"),
            PathBuf::from("build/gift/script.plutus")
        );
    }
}
