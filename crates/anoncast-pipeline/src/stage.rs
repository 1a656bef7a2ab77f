//! # Submission Typestate Machine
//!
//! A submission moves through a fixed sequence of stages. Each stage is a
//! distinct type and only exposes the transition to the next one, so the
//! ordering cannot be violated: there is no way to call `publish` on a
//! submission whose proof has not been verified.
//!
//! ```text
//! Received ─decode()─▶ Decoded ─check_root()─▶ RootChecked
//!     ─check_freshness()─▶ FreshnessChecked ─check_replay()─▶ ReplayChecked
//!     ─check_reply()─▶ ReplyChecked ─verify()─▶ ProofVerified
//!     ─publish()─▶ Published ─persist()─▶ Done
//! ```
//!
//! Every fallible transition returns a [`PipelineError`] tagged with the
//! stage the submission had reached. `persist` cannot fail: once a post
//! exists the submission has succeeded. A storage error is logged and
//! reported through `Intake<Done>::is_persisted`.

use std::fmt;

use anoncast_core::{
    decode_public_inputs, DecodedInputs, ExternalHash, MessageRecord, PublicationResult,
    Submission,
};
use anoncast_zkp::SubmissionVerifier;
use chrono::{DateTime, Utc};

use crate::error::{CheckFailure, ErrorKind, PipelineError, PipelineStage};
use crate::gateway::{GatewayError, PublicationGateway, PublishRequest};
use crate::store::MessageStore;
use crate::validator::{ReplyCheck, SubmissionValidator};

// ── Stage Types ──────────────────────────────────────────────────────

/// Submission accepted, nothing checked yet.
#[derive(Debug)]
pub struct Received;

/// Public inputs decoded.
#[derive(Debug)]
pub struct Decoded {
    decoded: DecodedInputs,
}

/// Root is known.
#[derive(Debug)]
pub struct RootChecked {
    decoded: DecodedInputs,
}

/// Timestamp is fresh.
#[derive(Debug)]
pub struct FreshnessChecked {
    decoded: DecodedInputs,
}

/// Proof has not been published before.
#[derive(Debug)]
pub struct ReplayChecked {
    decoded: DecodedInputs,
}

/// Reply target resolved or waived.
#[derive(Debug)]
pub struct ReplyChecked {
    decoded: DecodedInputs,
    reply: Option<ReplyCheck>,
}

/// Proof verified; the only stage that can publish.
#[derive(Debug)]
pub struct ProofVerified {
    decoded: DecodedInputs,
}

/// Post exists on the feed.
#[derive(Debug)]
pub struct Published {
    decoded: DecodedInputs,
    external_hash: ExternalHash,
}

/// Terminal success.
#[derive(Debug)]
pub struct Done {
    result: PublicationResult,
    persisted: bool,
}

/// Marker trait for pipeline stages. Sealed.
pub trait Stage: private::Sealed + fmt::Debug + Send {
    /// Runtime mirror of this stage.
    const STAGE: PipelineStage;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Received {}
    impl Sealed for super::Decoded {}
    impl Sealed for super::RootChecked {}
    impl Sealed for super::FreshnessChecked {}
    impl Sealed for super::ReplayChecked {}
    impl Sealed for super::ReplyChecked {}
    impl Sealed for super::ProofVerified {}
    impl Sealed for super::Published {}
    impl Sealed for super::Done {}
}

impl Stage for Received {
    const STAGE: PipelineStage = PipelineStage::Received;
}
impl Stage for Decoded {
    const STAGE: PipelineStage = PipelineStage::Decoded;
}
impl Stage for RootChecked {
    const STAGE: PipelineStage = PipelineStage::RootChecked;
}
impl Stage for FreshnessChecked {
    const STAGE: PipelineStage = PipelineStage::FreshnessChecked;
}
impl Stage for ReplayChecked {
    const STAGE: PipelineStage = PipelineStage::ReplayChecked;
}
impl Stage for ReplyChecked {
    const STAGE: PipelineStage = PipelineStage::ReplyChecked;
}
impl Stage for ProofVerified {
    const STAGE: PipelineStage = PipelineStage::ProofVerified;
}
impl Stage for Published {
    const STAGE: PipelineStage = PipelineStage::Published;
}
impl Stage for Done {
    const STAGE: PipelineStage = PipelineStage::Done;
}

// ── The Intake ───────────────────────────────────────────────────────

/// A submission in flight, parameterized by the stage it has reached.
#[derive(Debug)]
pub struct Intake<S: Stage> {
    submission: Submission,
    proof_digest: String,
    statement_digest: String,
    state: S,
}

impl<S: Stage> Intake<S> {
    /// Stage reached.
    pub fn stage(&self) -> PipelineStage {
        S::STAGE
    }

    /// The submission as received.
    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    /// SHA-256 of the proof bytes.
    pub fn proof_digest(&self) -> &str {
        &self.proof_digest
    }

    /// SHA-256 of the public inputs.
    pub fn statement_digest(&self) -> &str {
        &self.statement_digest
    }

    fn fail(&self, failure: CheckFailure) -> PipelineError {
        failure.at(S::STAGE)
    }

    fn map_state<T: Stage>(self, f: impl FnOnce(S) -> T) -> Intake<T> {
        tracing::debug!(from = %S::STAGE, to = %T::STAGE, "stage transition");
        Intake {
            submission: self.submission,
            proof_digest: self.proof_digest,
            statement_digest: self.statement_digest,
            state: f(self.state),
        }
    }
}

impl Intake<Received> {
    /// Accept a submission.
    pub fn new(submission: Submission) -> Self {
        let proof_digest = submission.proof_digest();
        let statement_digest = submission.statement_digest();
        Self {
            submission,
            proof_digest,
            statement_digest,
            state: Received,
        }
    }

    /// Decode the public inputs.
    pub fn decode(self) -> Result<Intake<Decoded>, PipelineError> {
        match decode_public_inputs(&self.submission.public_inputs) {
            Ok(decoded) => Ok(self.map_state(|_| Decoded { decoded })),
            Err(e) => Err(self.fail(CheckFailure::new(ErrorKind::DecodeError, e.to_string()))),
        }
    }
}

impl Intake<Decoded> {
    /// The decoded message.
    pub fn decoded(&self) -> &DecodedInputs {
        &self.state.decoded
    }

    /// Require a known membership root.
    pub fn check_root(
        self,
        validator: &SubmissionValidator,
    ) -> Result<Intake<RootChecked>, PipelineError> {
        match validator.check_root(&self.state.decoded) {
            Ok(()) => Ok(self.map_state(|s| RootChecked { decoded: s.decoded })),
            Err(f) => Err(self.fail(f)),
        }
    }
}

impl Intake<RootChecked> {
    /// Require a timestamp inside the freshness window relative to `now`.
    pub fn check_freshness(
        self,
        validator: &SubmissionValidator,
        now: i64,
    ) -> Result<Intake<FreshnessChecked>, PipelineError> {
        match validator.check_freshness(&self.state.decoded, now) {
            Ok(()) => Ok(self.map_state(|s| FreshnessChecked { decoded: s.decoded })),
            Err(f) => Err(self.fail(f)),
        }
    }
}

impl Intake<FreshnessChecked> {
    /// Decoded message content.
    pub fn decoded(&self) -> &DecodedInputs {
        &self.state.decoded
    }

    /// Refuse a proof, or a statement, that has already been published.
    ///
    /// Matching on the statement catches a second, differently encoded
    /// proof of the same public inputs.
    pub async fn check_replay(
        self,
        store: &dyn MessageStore,
    ) -> Result<Intake<ReplayChecked>, PipelineError> {
        let found = store
            .find_by_digests(&self.proof_digest, &self.statement_digest)
            .await;
        match found {
            Ok(None) => Ok(self.map_state(|s| ReplayChecked { decoded: s.decoded })),
            Ok(Some(existing)) => {
                let what = if existing.proof_digest == self.proof_digest {
                    "proof"
                } else {
                    "statement"
                };
                Err(self.fail(CheckFailure::new(
                    ErrorKind::ReplayDetected,
                    format!("{what} already published as {}", existing.external_hash),
                )))
            }
            Err(e) => Err(self.fail(CheckFailure::new(
                ErrorKind::InfrastructureFault,
                e.to_string(),
            ))),
        }
    }
}

impl Intake<ReplayChecked> {
    /// Resolve the reply target under the configured policy.
    pub async fn check_reply(
        self,
        validator: &SubmissionValidator,
    ) -> Result<Intake<ReplyChecked>, PipelineError> {
        match validator.check_reply(&self.state.decoded).await {
            Ok(reply) => Ok(self.map_state(|s| ReplyChecked {
                decoded: s.decoded,
                reply,
            })),
            Err(f) => Err(self.fail(f)),
        }
    }
}

impl Intake<ReplyChecked> {
    /// Outcome of the reply lookup, `None` for top-level posts.
    pub fn reply(&self) -> Option<&ReplyCheck> {
        self.state.reply.as_ref()
    }

    /// Verify the proof.
    pub async fn verify(
        self,
        verifier: &dyn SubmissionVerifier,
    ) -> Result<Intake<ProofVerified>, PipelineError> {
        match verifier.verify(&self.submission).await {
            Ok(true) => Ok(self.map_state(|s| ProofVerified { decoded: s.decoded })),
            Ok(false) => Err(self.fail(CheckFailure::new(
                ErrorKind::ProofInvalid,
                "proof does not verify against its public inputs",
            ))),
            Err(e) => Err(self.fail(CheckFailure::new(
                ErrorKind::InfrastructureFault,
                e.to_string(),
            ))),
        }
    }
}

impl Intake<ProofVerified> {
    /// Create the post. Called at most once per submission.
    pub async fn publish(
        self,
        gateway: &dyn PublicationGateway,
    ) -> Result<Intake<Published>, PipelineError> {
        let request = PublishRequest {
            text: self.state.decoded.text.clone(),
            parent: self.state.decoded.reply_to,
            channel: self.state.decoded.channel.clone(),
        };
        match gateway.publish(&request).await {
            Ok(external_hash) => Ok(self.map_state(|s| Published {
                decoded: s.decoded,
                external_hash,
            })),
            Err(GatewayError::Rejected { status, reason }) => {
                Err(self.fail(CheckFailure::new(
                    ErrorKind::InfrastructureFault,
                    format!("feed rejected publication with status {status}: {reason}"),
                )))
            }
            Err(GatewayError::Ambiguous(reason)) => {
                tracing::error!(
                    proof_digest = %self.proof_digest,
                    %reason,
                    "publication outcome unknown, not retrying"
                );
                Err(self.fail(CheckFailure::new(
                    ErrorKind::InfrastructureFault,
                    format!("publication outcome unknown: {reason}"),
                )))
            }
        }
    }
}

impl Intake<Published> {
    /// Feed-assigned identifier of the new post.
    pub fn external_hash(&self) -> &ExternalHash {
        &self.state.external_hash
    }

    /// Record the publication. Storage errors are logged, not returned.
    pub async fn persist(self, store: &dyn MessageStore, now: DateTime<Utc>) -> Intake<Done> {
        let record = MessageRecord::new(
            &self.state.decoded,
            &self.submission,
            self.state.external_hash.clone(),
            now,
        );
        let persisted = match store.save(&record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    external_hash = %self.state.external_hash,
                    error = %e,
                    "published message could not be persisted"
                );
                false
            }
        };
        self.map_state(|s| Done {
            result: PublicationResult::new(&s.decoded, s.external_hash),
            persisted,
        })
    }
}

impl Intake<Done> {
    /// Whether the store holds a record of this publication.
    pub fn is_persisted(&self) -> bool {
        self.state.persisted
    }

    /// The client-facing result.
    pub fn into_result(self) -> PublicationResult {
        self.state.result
    }
}
