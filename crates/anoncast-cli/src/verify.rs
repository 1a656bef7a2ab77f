//! # Verify Subcommand
//!
//! Offline check of a submission against the development backend: decode
//! the inputs, optionally check the root against a roots file, then verify
//! the proof. No feed access and no replay state.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use anoncast_core::{decode_public_inputs, Submission};
use anoncast_zkp::{CircuitArtifact, MockProofSystem, ProofSystem};

/// Arguments for `anoncast verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Submission JSON file, or `-` for standard input.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Circuit artifact. Defaults to the built-in development circuit.
    #[arg(long)]
    pub circuit: Option<PathBuf>,

    /// Roots file to check the submission's root against.
    #[arg(long)]
    pub roots: Option<PathBuf>,
}

/// Outcome of an offline check.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Inputs decode, the root is known (if checked) and the proof verifies.
    Valid,
    /// Decoding failed.
    Undecodable(String),
    /// The root is not in the roots file.
    UnknownRoot,
    /// The proof does not verify.
    ProofInvalid(String),
}

/// Check a submission.
pub fn check_submission(
    submission: &Submission,
    circuit: &CircuitArtifact,
    roots: Option<&str>,
) -> Result<Verdict> {
    let decoded = match decode_public_inputs(&submission.public_inputs) {
        Ok(d) => d,
        Err(e) => return Ok(Verdict::Undecodable(e.to_string())),
    };

    if let Some(raw) = roots {
        let (snapshot, _) = crate::roots::check_roots(raw)?;
        if snapshot.current != decoded.root && !snapshot.legacy.contains(&decoded.root) {
            return Ok(Verdict::UnknownRoot);
        }
    }

    let vk = MockProofSystem.setup(circuit)?;
    match MockProofSystem.verify(
        &vk,
        submission.proof.as_bytes(),
        &submission.public_input_bytes(),
    ) {
        Ok(true) => Ok(Verdict::Valid),
        Ok(false) => Ok(Verdict::ProofInvalid("proof does not match inputs".into())),
        Err(e) => Ok(Verdict::ProofInvalid(e.to_string())),
    }
}

/// Execute `anoncast verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let submission = crate::load_submission(&args.file)?;
    let circuit = match &args.circuit {
        Some(path) => CircuitArtifact::from_path(path)?,
        None => CircuitArtifact::development(),
    };
    let roots = args
        .roots
        .as_ref()
        .map(|p| crate::read_input(p))
        .transpose()?;

    let digest = submission.proof_digest();
    match check_submission(&submission, &circuit, roots.as_deref())? {
        Verdict::Valid => {
            println!("OK: proof valid digest={digest}");
            Ok(0)
        }
        Verdict::Undecodable(reason) => {
            println!("FAIL: inputs do not decode: {reason}");
            Ok(1)
        }
        Verdict::UnknownRoot => {
            println!("FAIL: root not in roots file");
            Ok(1)
        }
        Verdict::ProofInvalid(reason) => {
            println!("FAIL: proof invalid: {reason}");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anoncast_core::{encode_public_inputs, DecodedInputs, FieldElement};

    fn signed(root: u64) -> Submission {
        let decoded = DecodedInputs {
            text: "check me".into(),
            timestamp_unix: 1_714_564_800,
            root: FieldElement::from_u64(root),
            reply_to: None,
            channel: None,
        };
        let unsigned = Submission::new(Vec::new(), encode_public_inputs(&decoded));
        let vk = MockProofSystem
            .setup(&CircuitArtifact::development())
            .unwrap();
        let proof = MockProofSystem.prove(&vk, &unsigned.public_input_bytes());
        Submission::new(proof, unsigned.public_inputs)
    }

    #[test]
    fn valid_submission_passes() {
        let verdict =
            check_submission(&signed(2), &CircuitArtifact::development(), None).unwrap();
        assert_eq!(verdict, Verdict::Valid);
    }

    #[test]
    fn root_is_checked_against_file() {
        let roots = r#"{"current":"0x03","legacy":["0x02"]}"#;
        let circuit = CircuitArtifact::development();
        assert_eq!(
            check_submission(&signed(2), &circuit, Some(roots)).unwrap(),
            Verdict::Valid
        );
        assert_eq!(
            check_submission(&signed(9), &circuit, Some(roots)).unwrap(),
            Verdict::UnknownRoot
        );
    }

    #[test]
    fn other_circuit_rejects_proof() {
        let other = CircuitArtifact {
            bytecode: "some-other-circuit".into(),
            ..CircuitArtifact::development()
        };
        let verdict = check_submission(&signed(2), &other, None).unwrap();
        assert!(matches!(verdict, Verdict::ProofInvalid(_)));
    }

    #[test]
    fn truncated_proof_is_invalid() {
        let mut submission = signed(2);
        submission.proof = vec![0u8; 4].into();
        let verdict =
            check_submission(&submission, &CircuitArtifact::development(), None).unwrap();
        assert!(matches!(verdict, Verdict::ProofInvalid(_)));
    }

    #[test]
    fn undecodable_inputs_are_reported() {
        let submission = Submission::new(vec![0u8; 32], vec![FieldElement::from_u64(1)]);
        let verdict =
            check_submission(&submission, &CircuitArtifact::development(), None).unwrap();
        assert!(matches!(verdict, Verdict::Undecodable(_)));
    }
}
