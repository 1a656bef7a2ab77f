//! # Proof Backend Policy
//!
//! The mock backend accepts proofs anyone can compute. A deployment that
//! verifies with it publishes whatever it is sent, so production mode
//! refuses it when the verifier is built.
//!
//! The mode comes from `ANONCAST_PROOF_POLICY` (`production` or
//! `development`). Without it, release builds default to production and
//! debug builds to development.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable selecting the policy mode.
pub const PROOF_POLICY_ENV: &str = "ANONCAST_PROOF_POLICY";

/// Errors from proof policy enforcement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Mock backend refused in production mode.
    #[error("{backend} proof backend rejected: production mode requires a real proof backend")]
    MockProofRejected {
        /// The rejected backend's name.
        backend: String,
    },
    /// Unrecognized mode string.
    #[error("unknown proof policy \"{0}\" (expected production or development)")]
    UnknownMode(String),
}

/// The kind of backend a verifier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProofBackend {
    /// SHA-256 transcript, no soundness.
    Mock,
    /// Barretenberg UltraPlonk, the backend membership circuits compile to.
    UltraPlonk,
}

impl ProofBackend {
    /// Whether this backend provides real cryptographic soundness.
    pub fn is_real(self) -> bool {
        matches!(self, ProofBackend::UltraPlonk)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ProofBackend::Mock => "mock-sha256",
            ProofBackend::UltraPlonk => "ultraplonk",
        }
    }
}

impl fmt::Display for ProofBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Refuse the mock backend.
    Production,
    /// Accept any backend.
    Development,
}

impl FromStr for PolicyMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(PolicyMode::Production),
            "development" | "dev" => Ok(PolicyMode::Development),
            other => Err(PolicyError::UnknownMode(other.to_string())),
        }
    }
}

/// Decides whether a backend may be used in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofPolicy {
    mode: PolicyMode,
}

impl ProofPolicy {
    /// Create a policy with the given mode.
    pub fn new(mode: PolicyMode) -> Self {
        Self { mode }
    }

    /// Production policy.
    pub fn production() -> Self {
        Self::new(PolicyMode::Production)
    }

    /// Development policy.
    pub fn development() -> Self {
        Self::new(PolicyMode::Development)
    }

    /// Compile-time default: release builds are production.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::development()
        } else {
            Self::production()
        }
    }

    /// Read [`PROOF_POLICY_ENV`], falling back to [`build_default`].
    ///
    /// # Errors
    ///
    /// An unrecognized value is an error rather than a silent fallback.
    ///
    /// [`build_default`]: ProofPolicy::build_default
    pub fn from_environment() -> Result<Self, PolicyError> {
        match std::env::var(PROOF_POLICY_ENV) {
            Ok(val) if !val.trim().is_empty() => Ok(Self::new(val.parse()?)),
            _ => Ok(Self::build_default()),
        }
    }

    /// Check `backend` against this policy.
    pub fn validate(&self, backend: ProofBackend) -> Result<(), PolicyError> {
        match self.mode {
            PolicyMode::Production if !backend.is_real() => Err(PolicyError::MockProofRejected {
                backend: backend.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> PolicyMode {
        self.mode
    }
}
