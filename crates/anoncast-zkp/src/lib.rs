//! # anoncast-zkp: Membership Proof Verification
//!
//! Verifies the zero-knowledge membership proofs attached to anonymous
//! submissions.
//!
//! ## Architecture
//!
//! - [`ProofSystem`] is the sealed backend trait: `setup` derives a
//!   verifying key from a [`CircuitArtifact`], `verify` checks one proof.
//! - [`ProofVerifier`] binds a backend to a circuit, prepares the key once
//!   per process and runs verification on the blocking pool. The pipeline
//!   sees it through the object-safe [`SubmissionVerifier`].
//! - [`MockProofSystem`] is a transparent SHA-256 backend for development;
//!   [`ProofPolicy`] refuses it in production.
//!
//! A malformed proof is an invalid proof (`Ok(false)`). Only a verifier that
//! cannot reach a verdict reports a [`VerifierFault`].

pub mod circuit;
pub mod mock;
pub mod policy;
pub mod traits;
pub mod verifier;

pub use circuit::CircuitArtifact;
pub use mock::{MockProofSystem, MockVerifyingKey, MOCK_PROOF_LEN};
pub use policy::{PolicyError, PolicyMode, ProofBackend, ProofPolicy, PROOF_POLICY_ENV};
pub use traits::{ProofSystem, SetupError, VerifyError};
pub use verifier::{ProofVerifier, SubmissionVerifier, VerifierFault};
