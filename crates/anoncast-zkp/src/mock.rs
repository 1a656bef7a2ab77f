//! # Mock Proof System
//!
//! A deterministic, transparent backend for development and tests. A
//! "proof" is the SHA-256 of a domain tag, the circuit fingerprint and the
//! public inputs. Anyone can produce one, so [`ProofPolicy`] refuses this
//! backend in production.
//!
//! [`ProofPolicy`]: crate::policy::ProofPolicy

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::circuit::CircuitArtifact;
use crate::policy::ProofBackend;
use crate::traits::{ProofSystem, SetupError, VerifyError};

const TRANSCRIPT_TAG: &[u8] = b"anoncast-mock-proof-v1";

/// Length of a mock proof in bytes.
pub const MOCK_PROOF_LEN: usize = 32;

/// Verifying key: the fingerprint of the circuit it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVerifyingKey {
    circuit_fingerprint: [u8; 32],
}

/// SHA-256 transcript proof system.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl MockProofSystem {
    /// Produce the proof the mock backend accepts for `public_inputs`.
    pub fn prove(&self, vk: &MockVerifyingKey, public_inputs: &[u8]) -> Vec<u8> {
        transcript(&vk.circuit_fingerprint, public_inputs).to_vec()
    }
}

fn transcript(fingerprint: &[u8; 32], public_inputs: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(TRANSCRIPT_TAG);
    hasher.update(fingerprint);
    hasher.update(public_inputs);
    hasher.finalize().into()
}

impl ProofSystem for MockProofSystem {
    type VerifyingKey = MockVerifyingKey;

    fn backend(&self) -> ProofBackend {
        ProofBackend::Mock
    }

    fn setup(&self, circuit: &CircuitArtifact) -> Result<Self::VerifyingKey, SetupError> {
        circuit.validate()?;
        Ok(MockVerifyingKey {
            circuit_fingerprint: circuit.fingerprint(),
        })
    }

    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<bool, VerifyError> {
        if proof.len() != MOCK_PROOF_LEN {
            return Err(VerifyError::MalformedProof(format!(
                "expected {MOCK_PROOF_LEN} bytes, got {}",
                proof.len()
            )));
        }
        if public_inputs.len() % 32 != 0 {
            return Err(VerifyError::MalformedInputs(format!(
                "{} bytes is not a whole number of field elements",
                public_inputs.len()
            )));
        }
        let expected = transcript(&vk.circuit_fingerprint, public_inputs);
        Ok(bool::from(expected.as_slice().ct_eq(proof)))
    }
}
