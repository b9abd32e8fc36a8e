//! `.plutus` files on disk
//!
//! Loading accepts a text envelope, a file of CBOR hex, a raw CBOR file, or a
//! directory holding `script.plutus` or `script.cbor`.

use crate::compiler::CompiledProgram;
use crate::script::envelope::{unwrap_program, ScriptEnvelope, ScriptType, TextEnvelope};
use crate::script::error::ScriptError;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File names looked up inside a script directory, in order
const SCRIPT_FILES: [&str; 2] = ["script.plutus", "script.cbor"];

/// Write an envelope as pretty JSON
pub fn save_script(envelope: &ScriptEnvelope, path: &Path) -> Result<(), ScriptError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &envelope.to_text_envelope())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::info!("Wrote {} to {}", envelope.script_type(), path.display());
    Ok(())
}

/// Load a script; `script_type` applies when the file does not name one
pub fn load_script(path: &Path, script_type: ScriptType) -> Result<ScriptEnvelope, ScriptError> {
    let file = resolve(path)?;
    let content = fs::read(&file)?;

    if let Ok(envelope) = serde_json::from_slice::<TextEnvelope>(&content) {
        return ScriptEnvelope::from_text_envelope(&envelope);
    }

    let bytes = match std::str::from_utf8(&content)
        .ok()
        .and_then(|text| hex::decode(text.trim()).ok())
    {
        Some(decoded) => decoded,
        None => content,
    };

    let program = match unwrap_program(&bytes) {
        Ok(program) => program,
        Err(_) => CompiledProgram::from_flat(&bytes)?,
    };
    log::debug!("Loaded untyped script from {}", file.display());
    Ok(ScriptEnvelope::new(program, script_type))
}

fn resolve(path: &Path) -> Result<PathBuf, ScriptError> {
    if !path.is_dir() {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ScriptError::NotFound(path.to_path_buf()))
        };
    }
    SCRIPT_FILES
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.exists())
        .ok_or_else(|| ScriptError::NotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uplc::term::{Program, Term};

    fn envelope() -> ScriptEnvelope {
        let program = CompiledProgram::new(Program::new(Term::lambda(Term::lambda(
            Term::lambda(Term::unit()),
        ))));
        ScriptEnvelope::new(program, ScriptType::PlutusV2).with_description("always")
    }

    #[test]
    fn test_save_load_envelope() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("always.plutus");

        save_script(&envelope(), &path).unwrap();
        let loaded = load_script(&path, ScriptType::PlutusV1).unwrap();

        // Type comes from the file, not the fallback
        assert_eq!(loaded, envelope());
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("script.cbor"), "4746010000222499\n").unwrap();

        let loaded = load_script(temp_dir.path(), ScriptType::PlutusV1).unwrap();
        assert_eq!(loaded.script_type(), ScriptType::PlutusV1);
        assert_eq!(loaded.to_cbor_hex(), "4746010000222499");
    }

    #[test]
    fn test_load_raw_cbor() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("script.cbor");
        fs::write(&path, envelope().script_bytes()).unwrap();

        let loaded = load_script(&path, ScriptType::PlutusV2).unwrap();
        assert_eq!(loaded.program(), envelope().program());
    }

    #[test]
    fn test_missing_script() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_script(temp_dir.path(), ScriptType::PlutusV2),
            Err(ScriptError::NotFound(_))
        ));
    }
}
