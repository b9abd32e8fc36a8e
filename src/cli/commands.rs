//! CLI commands for the script toolchain
//!
//! Implements all command handlers for the CLI interface.

use crate::bench;
use crate::compiler::compile;
use crate::config::BuildConfig;
use crate::ledger::Network;
use crate::script::{load_script, save_script, wrap, ScriptType};
use crate::validators::{self, VALIDATOR_NAMES};
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Compile a built-in validator and write its `.plutus` envelope
pub fn cmd_build(
    config: &BuildConfig,
    validator: &str,
    out: Option<&Path>,
    stdout: bool,
) -> CliResult<()> {
    let function = validators::by_name(validator, config.script_type).ok_or_else(|| {
        format!(
            "unknown validator '{}' (available: {})",
            validator,
            VALIDATOR_NAMES.join(", ")
        )
    })?;

    let compiled = compile(&function)?;
    let envelope = wrap(compiled, config.script_type).with_description(&config.description);

    if stdout {
        println!("{}", envelope.to_json_string()?);
        return Ok(());
    }

    let path = match out {
        Some(p) => p.to_path_buf(),
        None => config.artifact_path(validator),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    save_script(&envelope, &path)?;

    println!("✅ Validator compiled!");
    println!("   📜 Validator: {}", validator);
    println!("   🔧 Type: {}", envelope.script_type());
    println!("   📦 Size: {} bytes", envelope.script_bytes().len());
    println!("   🔑 Hash: {}", envelope.hash_hex());
    println!(
        "   🏠 Address ({}): {}",
        config.network,
        envelope.address(config.network)?
    );
    println!("   📁 Output: {}", path.display());

    Ok(())
}

/// Show everything known about a script file
pub fn cmd_inspect(path: &Path, script_type: ScriptType, network: Network) -> CliResult<()> {
    let envelope = load_script(path, script_type)?;
    let compiled = envelope.program();

    println!("📜 Script {}", path.display());
    println!("   ├─ Type: {}", envelope.script_type());
    if !envelope.description().is_empty() {
        println!("   ├─ Description: {}", envelope.description());
    }
    println!("   ├─ Flat size: {} bytes", compiled.size());
    println!("   ├─ Terms: {}", compiled.program().term.size());
    println!("   ├─ Hash: {}", envelope.hash_hex());
    println!("   └─ Address ({}): {}", network, envelope.address(network)?);
    println!("\n{}", compiled.program());
    println!("\n📝 Disassembly:");
    print!("{}", compiled.disassemble());

    Ok(())
}

/// Print the script's enterprise address
pub fn cmd_address(path: &Path, script_type: ScriptType, network: Network) -> CliResult<()> {
    let envelope = load_script(path, script_type)?;
    println!("{}", envelope.address(network)?);
    Ok(())
}

/// Evaluate the benchmark scenarios and print CSV rows
pub fn cmd_bench(path: &Path, script_type: ScriptType, validator: &str) -> CliResult<()> {
    let envelope = load_script(path, script_type)?;
    for result in bench::run(&envelope, validator)? {
        println!("{}", result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_then_inspect() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            output_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        cmd_build(&config, "gift", None, false).unwrap();
        let artifact = config.artifact_path("gift");
        assert!(artifact.exists());

        cmd_inspect(&artifact, ScriptType::PlutusV2, Network::Testnet).unwrap();
        cmd_address(artifact.parent().unwrap(), ScriptType::PlutusV2, Network::Mainnet).unwrap();
        cmd_bench(&artifact, ScriptType::PlutusV2, "gift").unwrap();
    }

    #[test]
    fn test_build_unknown_validator() {
        let config = BuildConfig::default();
        assert!(cmd_build(&config, "vesting", None, true).is_err());
    }
}
