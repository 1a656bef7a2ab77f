//! # Decode Subcommand
//!
//! Prints the message content a submission's public inputs commit to,
//! exactly as the service would see it before any validation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use anoncast_core::{decode_public_inputs, iso8601_from_unix, DecodedInputs, Submission};

/// Arguments for `anoncast decode`.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Submission JSON file, or `-` for standard input.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the result here instead of standard output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Decoded view of a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedView {
    /// Message content.
    #[serde(flatten)]
    pub inputs: DecodedInputs,
    /// Proof timestamp rendered as ISO 8601.
    pub timestamp: Option<String>,
    /// SHA-256 of the proof bytes.
    pub proof_digest: String,
    /// SHA-256 of the public inputs.
    pub statement_digest: String,
    /// Proof length in bytes.
    pub proof_len: usize,
}

/// Decode a submission into a [`DecodedView`].
pub fn decode_submission(submission: &Submission) -> Result<DecodedView> {
    let inputs = decode_public_inputs(&submission.public_inputs)
        .context("public inputs do not decode")?;
    Ok(DecodedView {
        timestamp: iso8601_from_unix(inputs.timestamp_unix),
        inputs,
        proof_digest: submission.proof_digest(),
        statement_digest: submission.statement_digest(),
        proof_len: submission.proof.len(),
    })
}

/// Execute `anoncast decode`.
pub fn run_decode(args: &DecodeArgs) -> Result<u8> {
    let submission = crate::load_submission(&args.file)?;
    let view = decode_submission(&submission)?;
    tracing::debug!(digest = %view.proof_digest, "decoded submission");
    crate::emit_json(&view, args.output.as_ref())?;
    Ok(0)
}
