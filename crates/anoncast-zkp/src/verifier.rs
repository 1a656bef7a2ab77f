//! # Prepared Proof Verifier
//!
//! [`ProofVerifier`] owns one backend and one circuit artifact. The
//! verifying key is derived lazily on first use and then shared by every
//! verification for the lifetime of the process. Concurrent first callers
//! wait on the same setup rather than each running it.
//!
//! Setup and verification are CPU-bound and run on the blocking pool so a
//! slow proof does not stall unrelated requests.

use std::sync::Arc;
use std::time::Instant;

use anoncast_core::Submission;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::circuit::CircuitArtifact;
use crate::policy::{PolicyError, ProofBackend, ProofPolicy};
use crate::traits::{ProofSystem, SetupError, VerifyError};

/// A verifier that could not reach a verdict.
///
/// Distinct from an invalid proof: the submission may be fine, the
/// deployment is not.
#[derive(Error, Debug, Clone)]
pub enum VerifierFault {
    /// Deriving the verifying key failed.
    #[error("verifier setup failed: {0}")]
    Setup(#[from] SetupError),
    /// The backend failed while verifying.
    #[error("proof backend failure: {0}")]
    Backend(String),
    /// The blocking task panicked or was cancelled.
    #[error("verification task failed: {0}")]
    Task(String),
    /// The backend is not allowed under the active policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Object-safe view of a verifier, used by the pipeline.
#[async_trait]
pub trait SubmissionVerifier: Send + Sync {
    /// Run one-time setup if it has not run yet.
    async fn prepare(&self) -> Result<(), VerifierFault>;

    /// Check a submission's proof. `Ok(false)` means the proof is invalid.
    async fn verify(&self, submission: &Submission) -> Result<bool, VerifierFault>;

    /// Whether setup has completed.
    fn is_prepared(&self) -> bool;

    /// Backend in use.
    fn backend(&self) -> ProofBackend;
}

/// Verifier bound to one backend and one circuit.
pub struct ProofVerifier<P: ProofSystem> {
    system: Arc<P>,
    circuit: CircuitArtifact,
    key: OnceCell<Arc<P::VerifyingKey>>,
}

impl<P: ProofSystem> ProofVerifier<P> {
    /// Create an unprepared verifier. No policy check is applied.
    pub fn new(system: P, circuit: CircuitArtifact) -> Self {
        Self {
            system: Arc::new(system),
            circuit,
            key: OnceCell::new(),
        }
    }

    /// Create a verifier after checking the backend against `policy`.
    pub fn with_policy(
        system: P,
        circuit: CircuitArtifact,
        policy: &ProofPolicy,
    ) -> Result<Self, PolicyError> {
        policy.validate(system.backend())?;
        Ok(Self::new(system, circuit))
    }

    /// The backend instance.
    pub fn system(&self) -> &P {
        &self.system
    }

    /// The verifying key, once prepared.
    pub fn verifying_key(&self) -> Option<&P::VerifyingKey> {
        self.key.get().map(Arc::as_ref)
    }

    async fn key(&self) -> Result<Arc<P::VerifyingKey>, VerifierFault> {
        self.key
            .get_or_try_init(|| async {
                let system = Arc::clone(&self.system);
                let circuit = self.circuit.clone();
                let started = Instant::now();
                let vk = tokio::task::spawn_blocking(move || system.setup(&circuit))
                    .await
                    .map_err(|e| VerifierFault::Task(e.to_string()))??;
                tracing::info!(
                    backend = %self.system.backend(),
                    noir_version = %self.circuit.noir_version,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "proof verifier prepared"
                );
                Ok::<_, VerifierFault>(Arc::new(vk))
            })
            .await
            .map(Arc::clone)
    }
}

#[async_trait]
impl<P: ProofSystem> SubmissionVerifier for ProofVerifier<P> {
    async fn prepare(&self) -> Result<(), VerifierFault> {
        self.key().await.map(|_| ())
    }

    async fn verify(&self, submission: &Submission) -> Result<bool, VerifierFault> {
        let vk = self.key().await?;
        let system = Arc::clone(&self.system);
        let proof = submission.proof.as_bytes().to_vec();
        let inputs = submission.public_input_bytes();

        let outcome = tokio::task::spawn_blocking(move || system.verify(&vk, &proof, &inputs))
            .await
            .map_err(|e| VerifierFault::Task(e.to_string()))?;

        match outcome {
            Ok(valid) => Ok(valid),
            Err(VerifyError::MalformedProof(reason)) | Err(VerifyError::MalformedInputs(reason)) => {
                tracing::debug!(%reason, "structurally malformed proof treated as invalid");
                Ok(false)
            }
            Err(VerifyError::Backend(reason)) => Err(VerifierFault::Backend(reason)),
        }
    }

    fn is_prepared(&self) -> bool {
        self.key.initialized()
    }

    fn backend(&self) -> ProofBackend {
        self.system.backend()
    }
}
