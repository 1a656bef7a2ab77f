//! # Proof System Trait (Sealed)
//!
//! The abstraction every verification backend implements. The trait is
//! sealed: only backends defined in this crate can exist, so a deployment
//! cannot be handed an arbitrary verifier that accepts everything.
//!
//! A backend has two phases. [`ProofSystem::setup`] turns a compiled
//! circuit into a verifying key and may be expensive; it runs once per
//! process. [`ProofSystem::verify`] checks one proof against public inputs
//! and must be deterministic and side-effect free.

use thiserror::Error;

use crate::circuit::CircuitArtifact;
use crate::policy::ProofBackend;

/// Error while deriving a verifying key from a circuit artifact.
///
/// Always a deployment problem, never the client's fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The artifact is missing required content.
    #[error("malformed circuit artifact: {0}")]
    MalformedArtifact(String),
    /// The artifact was compiled for a different backend or version.
    #[error("incompatible circuit artifact: {0}")]
    Incompatible(String),
    /// The artifact could not be read.
    #[error("failed to load circuit artifact from {path}: {reason}")]
    Load {
        /// Where the artifact was expected.
        path: String,
        /// Underlying I/O or parse error.
        reason: String,
    },
}

/// Error during proof verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed (wrong length, corrupt encoding).
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The public inputs cannot be interpreted by the backend.
    #[error("malformed public inputs: {0}")]
    MalformedInputs(String),
    /// The backend itself failed; the proof's validity is unknown.
    #[error("proof backend failure: {0}")]
    Backend(String),
}

/// Private module that seals [`ProofSystem`].
pub(crate) mod private {
    pub trait Sealed {}
}

/// Sealed trait implemented by proof verification backends.
///
/// Requires `Send + Sync + 'static` so a backend can be shared across
/// request handlers and moved onto blocking worker threads.
pub trait ProofSystem: private::Sealed + Send + Sync + 'static {
    /// Key derived once from the circuit artifact.
    type VerifyingKey: Send + Sync + 'static;

    /// Which backend this is, for policy enforcement.
    fn backend(&self) -> ProofBackend;

    /// Derive the verifying key for `circuit`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the artifact is unusable by this backend.
    fn setup(&self, circuit: &CircuitArtifact) -> Result<Self::VerifyingKey, SetupError>;

    /// Verify `proof` against the flattened public inputs (32-byte
    /// big-endian words).
    ///
    /// `Ok(true)` if valid, `Ok(false)` if well-formed but invalid.
    ///
    /// # Errors
    ///
    /// [`VerifyError::MalformedProof`] and [`VerifyError::MalformedInputs`]
    /// for structurally broken input; [`VerifyError::Backend`] if the
    /// backend could not reach a verdict.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<bool, VerifyError>;
}

impl private::Sealed for crate::mock::MockProofSystem {}
