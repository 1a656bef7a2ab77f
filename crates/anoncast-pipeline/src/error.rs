//! # Pipeline Outcomes
//!
//! Every submission ends in exactly one terminal outcome: a
//! [`PublicationResult`](anoncast_core::PublicationResult) or a
//! [`PipelineError`]. The error records what went wrong ([`ErrorKind`]),
//! a human-readable reason, and the [`PipelineStage`] the submission had
//! reached when it stopped.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Public inputs do not decode into a message.
    DecodeError,
    /// Membership root is not in the registry.
    InvalidRoot,
    /// Proof timestamp is outside the freshness window.
    StaleProof,
    /// Proof does not verify.
    ProofInvalid,
    /// Reply target could not be found on the feed.
    ReplyTargetUnresolved,
    /// This proof has already been published.
    ReplayDetected,
    /// A collaborator failed; the submission itself may be fine.
    InfrastructureFault,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DecodeError => "DECODE_ERROR",
            ErrorKind::InvalidRoot => "INVALID_ROOT",
            ErrorKind::StaleProof => "STALE_PROOF",
            ErrorKind::ProofInvalid => "PROOF_INVALID",
            ErrorKind::ReplyTargetUnresolved => "REPLY_TARGET_UNRESOLVED",
            ErrorKind::ReplayDetected => "REPLAY_DETECTED",
            ErrorKind::InfrastructureFault => "INFRASTRUCTURE_FAULT",
        }
    }

    /// Whether resubmitting the same input could ever succeed.
    ///
    /// Only infrastructure faults qualify. Whether a particular fault is
    /// safe to retry also depends on the stage; see
    /// [`PipelineError::is_retryable`].
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::InfrastructureFault)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Runtime mirror of the typestate stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Submission accepted for processing.
    Received,
    /// Public inputs decoded.
    Decoded,
    /// Root found in the registry.
    RootChecked,
    /// Timestamp inside the freshness window.
    FreshnessChecked,
    /// Proof not previously published.
    ReplayChecked,
    /// Reply target resolved or waived by policy.
    ReplyChecked,
    /// Proof verified.
    ProofVerified,
    /// Post created on the feed.
    Published,
    /// Result produced.
    Done,
}

impl PipelineStage {
    /// Stage name as it appears in logs.
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Decoded => "decoded",
            PipelineStage::RootChecked => "root_checked",
            PipelineStage::FreshnessChecked => "freshness_checked",
            PipelineStage::ReplayChecked => "replay_checked",
            PipelineStage::ReplyChecked => "reply_checked",
            PipelineStage::ProofVerified => "proof_verified",
            PipelineStage::Published => "published",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal failure of a submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at stage {stage}: {reason}")]
pub struct PipelineError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Detail for logs and, for client errors, the response body.
    pub reason: String,
    /// Last stage the submission completed.
    pub stage: PipelineStage,
}

impl PipelineError {
    /// Construct an error.
    pub fn new(kind: ErrorKind, reason: impl Into<String>, stage: PipelineStage) -> Self {
        Self {
            kind,
            reason: reason.into(),
            stage,
        }
    }

    /// Whether a client may resubmit.
    ///
    /// Faults before verification completed are retryable. A fault while
    /// publishing is not: the post may already exist.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && self.stage < PipelineStage::ProofVerified
    }

    /// Whether the failure is the client's fault rather than ours.
    pub fn is_rejection(&self) -> bool {
        self.kind != ErrorKind::InfrastructureFault
    }
}

/// A failed check before the pipeline attaches a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Why.
    pub reason: String,
}

impl CheckFailure {
    /// Construct a failure.
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Attach the stage the pipeline had reached.
    pub fn at(self, stage: PipelineStage) -> PipelineError {
        PipelineError::new(self.kind, self.reason, stage)
    }
}
