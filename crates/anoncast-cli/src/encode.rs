//! # Encode Subcommand
//!
//! Builds the public inputs for a message and, with `--sign`, attaches a
//! proof from the development backend. Useful for exercising a service
//! running with `ANONCAST_PROOF_POLICY=development`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use anoncast_core::{
    decode_public_inputs, encode_public_inputs, CastHash, ChannelId, DecodedInputs, FieldElement,
    Submission,
};
use anoncast_zkp::{CircuitArtifact, MockProofSystem, ProofSystem};

/// Arguments for `anoncast encode`.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message body.
    #[arg(long)]
    pub text: String,

    /// Membership root the proof is made against (hex field element).
    #[arg(long)]
    pub root: String,

    /// Proof timestamp in unix seconds. Defaults to now.
    #[arg(long)]
    pub timestamp: Option<i64>,

    /// Hash of the cast to reply to.
    #[arg(long, value_name = "HASH")]
    pub reply_to: Option<String>,

    /// Channel to post into.
    #[arg(long)]
    pub channel: Option<String>,

    /// Attach a development-backend proof.
    #[arg(long)]
    pub sign: bool,

    /// Circuit artifact to derive the development key from.
    #[arg(long, requires = "sign")]
    pub circuit: Option<PathBuf>,

    /// Write the submission here instead of standard output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Build a submission from command-line fields.
///
/// The inputs are decoded again before returning, so anything the
/// service would refuse at intake is refused here too.
pub fn build_submission(args: &EncodeArgs, now: i64) -> Result<Submission> {
    let root: FieldElement = args.root.parse().context("invalid --root")?;
    let reply_to = args
        .reply_to
        .as_deref()
        .map(str::parse::<CastHash>)
        .transpose()
        .context("invalid --reply-to")?;
    let channel = args
        .channel
        .clone()
        .map(ChannelId::new)
        .transpose()
        .context("invalid --channel")?;

    let decoded = DecodedInputs {
        text: args.text.clone(),
        timestamp_unix: args.timestamp.unwrap_or(now),
        root,
        reply_to,
        channel,
    };
    let public_inputs = encode_public_inputs(&decoded);
    let check = decode_public_inputs(&public_inputs).context("message cannot be encoded")?;
    if check != decoded {
        bail!("message does not survive encoding; check for trailing NUL bytes");
    }

    let unsigned = Submission::new(Vec::new(), public_inputs);
    if !args.sign {
        return Ok(unsigned);
    }

    let circuit = match &args.circuit {
        Some(path) => CircuitArtifact::from_path(path)?,
        None => CircuitArtifact::development(),
    };
    let vk = MockProofSystem.setup(&circuit)?;
    let proof = MockProofSystem.prove(&vk, &unsigned.public_input_bytes());
    Ok(Submission::new(proof, unsigned.public_inputs))
}

/// Execute `anoncast encode`.
pub fn run_encode(args: &EncodeArgs) -> Result<u8> {
    let submission = build_submission(args, chrono::Utc::now().timestamp())?;
    if !args.sign {
        tracing::info!("no proof attached; pass --sign for a development proof");
    }
    crate::emit_json(&submission, args.output.as_ref())?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(text: &str) -> EncodeArgs {
        EncodeArgs {
            text: text.into(),
            root: "0x2a".into(),
            timestamp: Some(1_714_564_800),
            reply_to: None,
            channel: None,
            sign: false,
            circuit: None,
            output: None,
        }
    }

    #[test]
    fn unsigned_submission_has_empty_proof() {
        let submission = build_submission(&args("gm"), 0).unwrap();
        assert!(submission.proof.is_empty());
        let decoded = decode_public_inputs(&submission.public_inputs).unwrap();
        assert_eq!(decoded.text, "gm");
        assert_eq!(decoded.root, FieldElement::from_u64(42));
        assert_eq!(decoded.timestamp_unix, 1_714_564_800);
    }

    #[test]
    fn timestamp_defaults_to_now() {
        let mut a = args("gm");
        a.timestamp = None;
        let submission = build_submission(&a, 99).unwrap();
        let decoded = decode_public_inputs(&submission.public_inputs).unwrap();
        assert_eq!(decoded.timestamp_unix, 99);
    }

    #[test]
    fn reply_and_channel_are_encoded() {
        let mut a = args("reply");
        a.reply_to = Some(format!("0x{}", "ab".repeat(20)));
        a.channel = Some("memes".into());
        let submission = build_submission(&a, 0).unwrap();
        let decoded = decode_public_inputs(&submission.public_inputs).unwrap();
        assert_eq!(decoded.reply_to, Some(CastHash::from_bytes([0xab; 20])));
        assert_eq!(decoded.channel.unwrap().as_str(), "memes");
    }

    #[test]
    fn bad_root_is_reported() {
        let mut a = args("gm");
        a.root = "not-hex".into();
        let err = build_submission(&a, 0).unwrap_err();
        assert!(format!("{err:#}").contains("--root"));
    }

    #[test]
    fn empty_text_is_refused() {
        assert!(build_submission(&args(""), 0).is_err());
    }

    #[test]
    fn signed_submission_verifies_under_development_key() {
        let mut a = args("signed");
        a.sign = true;
        let submission = build_submission(&a, 0).unwrap();
        let vk = MockProofSystem
            .setup(&CircuitArtifact::development())
            .unwrap();
        let ok = MockProofSystem
            .verify(
                &vk,
                submission.proof.as_bytes(),
                &submission.public_input_bytes(),
            )
            .unwrap();
        assert!(ok);
    }
}
