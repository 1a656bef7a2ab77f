//! # Message Pipeline
//!
//! Drives one submission through the [`Intake`] typestate machine and
//! produces its single terminal outcome.
//!
//! Two submissions of the same statement may race past the replay check.
//! The pipeline therefore also claims the statement digest for the
//! duration of the run; a concurrent duplicate sees the claim and is
//! refused as a replay.
//!
//! A claim normally ends with the run. When the post was created but the
//! store did not record it, the claim is kept until the proof falls out of
//! the freshness window, after which the freshness check refuses it anyway.

use std::collections::HashMap;
use std::sync::Arc;

use anoncast_core::{PublicationResult, Submission};
use anoncast_zkp::SubmissionVerifier;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::Instrument;

use crate::clock::{Clock, SystemClock};
use crate::error::{ErrorKind, PipelineError, PipelineStage};
use crate::gateway::PublicationGateway;
use crate::registry::RootRegistry;
use crate::stage::{Intake, Received};
use crate::store::MessageStore;
use crate::validator::SubmissionValidator;

/// Orchestrates validation, verification, publication and persistence.
pub struct MessagePipeline {
    validator: SubmissionValidator,
    verifier: Arc<dyn SubmissionVerifier>,
    gateway: Arc<dyn PublicationGateway>,
    store: Arc<dyn MessageStore>,
    clock: Arc<dyn Clock>,
    claims: DigestClaims,
}

impl MessagePipeline {
    /// Assemble a pipeline using the system clock.
    pub fn new(
        validator: SubmissionValidator,
        verifier: Arc<dyn SubmissionVerifier>,
        gateway: Arc<dyn PublicationGateway>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            validator,
            verifier,
            gateway,
            store,
            clock: Arc::new(SystemClock),
            claims: DigestClaims::default(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The root registry.
    pub fn registry(&self) -> &Arc<RootRegistry> {
        self.validator.registry()
    }

    /// The proof verifier.
    pub fn verifier(&self) -> &Arc<dyn SubmissionVerifier> {
        &self.verifier
    }

    /// The message store.
    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Ready once roots are loaded and the verifier is prepared.
    pub fn is_ready(&self) -> bool {
        self.registry().is_loaded() && self.verifier.is_prepared()
    }

    /// Process one submission to completion.
    pub async fn submit(&self, submission: Submission) -> Result<PublicationResult, PipelineError> {
        let intake = Intake::new(submission);
        let digest = intake.proof_digest();
        let span = tracing::info_span!(
            "submission",
            proof = %digest.get(..16).unwrap_or(digest)
        );

        let outcome = self.run(intake).instrument(span.clone()).await;
        span.in_scope(|| match &outcome {
            Ok(result) => tracing::info!(
                external_hash = %result.external_hash,
                reply_to = ?result.reply_to,
                "message published"
            ),
            Err(e) if e.is_rejection() => tracing::info!(
                kind = %e.kind,
                stage = %e.stage,
                reason = %e.reason,
                "submission rejected"
            ),
            Err(e) => tracing::error!(
                kind = %e.kind,
                stage = %e.stage,
                reason = %e.reason,
                retryable = e.is_retryable(),
                "submission failed"
            ),
        });
        outcome
    }

    async fn run(&self, intake: Intake<Received>) -> Result<PublicationResult, PipelineError> {
        let decoded = intake.decode()?;
        let rooted = decoded.check_root(&self.validator)?;
        let now = self.clock.now_unix();
        let fresh = rooted.check_freshness(&self.validator, now)?;

        let mut claim = self
            .claims
            .acquire(fresh.statement_digest(), now)
            .map_err(|held| {
                PipelineError::new(
                    ErrorKind::ReplayDetected,
                    held.reason(),
                    PipelineStage::FreshnessChecked,
                )
            })?;
        let expires_at = fresh
            .decoded()
            .timestamp_unix
            .saturating_add(self.validator.config().freshness_window_secs);

        let unique = fresh.check_replay(self.store.as_ref()).await?;
        let replied = unique.check_reply(&self.validator).await?;
        let verified = replied.verify(self.verifier.as_ref()).await?;
        let published = verified.publish(self.gateway.as_ref()).await?;
        let done = published.persist(self.store.as_ref(), Utc::now()).await;
        if !done.is_persisted() {
            claim.hold_until(expires_at);
        }
        Ok(done.into_result())
    }
}

/// Statement digests owned by a running submission, or published without
/// a stored record.
#[derive(Debug, Default)]
struct DigestClaims {
    entries: Mutex<HashMap<String, Held>>,
}

/// Why a digest cannot be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Held {
    Running,
    /// Published but not stored. Held while the proof is still fresh.
    Unrecorded { expires_at: i64 },
}

impl Held {
    fn reason(self) -> &'static str {
        match self {
            Held::Running => "an identical statement is already being processed",
            Held::Unrecorded { .. } => "statement already published",
        }
    }
}

impl DigestClaims {
    /// Claim `digest` for one run. Expired holds are dropped first.
    fn acquire(&self, digest: &str, now: i64) -> Result<Claim<'_>, Held> {
        let mut entries = self.entries.lock();
        entries.retain(|_, held| match held {
            Held::Running => true,
            Held::Unrecorded { expires_at } => *expires_at >= now,
        });
        if let Some(held) = entries.get(digest) {
            return Err(*held);
        }
        entries.insert(digest.to_string(), Held::Running);
        Ok(Claim {
            claims: self,
            digest: digest.to_string(),
            hold_until: None,
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// A running claim. Released on drop unless a hold was requested.
struct Claim<'a> {
    claims: &'a DigestClaims,
    digest: String,
    hold_until: Option<i64>,
}

impl Claim<'_> {
    fn hold_until(&mut self, expires_at: i64) {
        self.hold_until = Some(expires_at);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut entries = self.claims.entries.lock();
        match self.hold_until {
            Some(expires_at) => {
                entries.insert(
                    std::mem::take(&mut self.digest),
                    Held::Unrecorded { expires_at },
                );
            }
            None => {
                entries.remove(&self.digest);
            }
        }
    }
}
