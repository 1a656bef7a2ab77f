//! # Circuit Artifacts
//!
//! A compiled membership circuit in the JSON layout the Noir toolchain
//! emits (`noir_version`, `hash`, `abi`, `bytecode`). Only the fields a
//! verifier needs are modelled; the ABI is kept opaque.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::traits::SetupError;

/// Compiled circuit loaded from disk or built in for development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitArtifact {
    /// Compiler version that produced the artifact.
    #[serde(default)]
    pub noir_version: String,
    /// Compiler-assigned circuit hash.
    #[serde(default)]
    pub hash: Option<serde_json::Value>,
    /// Parameter and return-value layout.
    #[serde(default)]
    pub abi: serde_json::Value,
    /// Serialized circuit bytecode (base64 in compiler output).
    pub bytecode: String,
}

impl CircuitArtifact {
    /// Built-in artifact for development deployments running the mock
    /// backend without a compiled circuit on disk.
    pub fn development() -> Self {
        Self {
            noir_version: "development".to_string(),
            hash: None,
            abi: serde_json::Value::Null,
            bytecode: "anoncast-development-circuit".to_string(),
        }
    }

    /// Parse an artifact from JSON.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let artifact: Self = serde_json::from_str(json)
            .map_err(|e| SetupError::MalformedArtifact(e.to_string()))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Read and parse an artifact file.
    pub fn from_path(path: &Path) -> Result<Self, SetupError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SetupError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            SetupError::MalformedArtifact(reason) => SetupError::Load {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Reject artifacts with no bytecode.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.bytecode.trim().is_empty() {
            return Err(SetupError::MalformedArtifact(
                "bytecode is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// SHA-256 of the bytecode.
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(self.bytecode.as_bytes()).into()
    }
}
