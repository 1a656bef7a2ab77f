//! # Roots Subcommand
//!
//! Validates a roots file in the layout `ANONCAST_ROOTS_FILE` expects:
//!
//! ```json
//! { "current": "0x…", "legacy": ["0x…"] }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use anoncast_pipeline::{FileRootSource, RootSnapshot};

/// Arguments for `anoncast roots`.
#[derive(Args, Debug)]
pub struct RootsArgs {
    /// Roots JSON file, or `-` for standard input.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also fail when the file lists a root more than once.
    #[arg(long)]
    pub strict: bool,
}

/// Parse and check a roots document.
///
/// Returns the snapshot plus warnings that do not make it unusable.
pub fn check_roots(raw: &str) -> Result<(RootSnapshot, Vec<String>)> {
    let snapshot = FileRootSource::parse(raw)?;
    let mut warnings = Vec::new();

    if snapshot.current.is_zero() {
        bail!("current root is zero");
    }
    if snapshot.legacy.contains(&snapshot.current) {
        warnings.push(format!(
            "current root {} is also listed as legacy",
            snapshot.current
        ));
    }
    let mut seen = HashSet::new();
    for root in &snapshot.legacy {
        if !seen.insert(root) {
            warnings.push(format!("legacy root {root} is listed more than once"));
        }
    }
    Ok((snapshot, warnings))
}

/// Execute `anoncast roots`.
pub fn run_roots(args: &RootsArgs) -> Result<u8> {
    let raw = crate::read_input(&args.file)?;
    let (snapshot, warnings) = check_roots(&raw)?;
    for w in &warnings {
        println!("WARN: {w}");
    }
    if args.strict && !warnings.is_empty() {
        println!("FAIL: {} warning(s) in strict mode", warnings.len());
        return Ok(1);
    }
    println!(
        "OK: current={} legacy={}",
        snapshot.current,
        snapshot.legacy.len()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anoncast_core::FieldElement;

    #[test]
    fn accepts_well_formed_file() {
        let (snapshot, warnings) =
            check_roots(r#"{"current":"0x02","legacy":["0x01"]}"#).unwrap();
        assert_eq!(snapshot.current, FieldElement::from_u64(2));
        assert_eq!(snapshot.legacy, vec![FieldElement::from_u64(1)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn legacy_is_optional() {
        let (snapshot, _) = check_roots(r#"{"current":"0x02"}"#).unwrap();
        assert!(snapshot.legacy.is_empty());
    }

    #[test]
    fn duplicates_are_warnings() {
        let (_, warnings) =
            check_roots(r#"{"current":"0x02","legacy":["0x01","0x01","0x02"]}"#).unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn zero_current_root_is_an_error() {
        assert!(check_roots(r#"{"current":"0x00"}"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(check_roots("{\"current\":").is_err());
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        std::fs::write(&path, r#"{"current":"0x02","legacy":["0x02"]}"#).unwrap();
        let code = run_roots(&RootsArgs {
            file: path.clone(),
            strict: true,
        })
        .unwrap();
        assert_eq!(code, 1);
        let code = run_roots(&RootsArgs {
            file: path,
            strict: false,
        })
        .unwrap();
        assert_eq!(code, 0);
    }
}
