//! # anoncast-cli: Operator Tooling
//!
//! Provides the `anoncast` command-line interface for working with
//! submissions and root files without a running service.
//!
//! ## Subcommands
//!
//! - `anoncast decode`: Show the message content a submission commits to.
//! - `anoncast encode`: Build public inputs (and optionally a development proof).
//! - `anoncast roots`: Validate a roots file before deploying it.
//! - `anoncast verify`: Run a submission through the development verifier.
//!
//! ```bash
//! anoncast encode --text "gm" --root 0x2a --sign > submission.json
//! anoncast decode submission.json
//! anoncast verify submission.json
//! ```

pub mod decode;
pub mod encode;
pub mod roots;
pub mod verify;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use anoncast_core::Submission;

/// Read a file, or standard input when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse a submission JSON document (`proof`, `publicInputs`).
pub fn load_submission(path: &Path) -> Result<Submission> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse submission: {}", path.display()))
}

/// Write pretty JSON to `output`, or print it when no path is given.
pub fn emit_json<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_submission_reads_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, r#"{"proof":"0xabcd","publicInputs":["0x01","0x02"]}"#).unwrap();
        let submission = load_submission(&path).unwrap();
        assert_eq!(submission.proof.as_bytes(), &[0xab, 0xcd]);
        assert_eq!(submission.public_inputs.len(), 2);
    }

    #[test]
    fn load_submission_reports_path_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_submission(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn emit_json_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit_json(&serde_json::json!({"ok": true}), Some(&path)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"ok\": true"));
    }
}
