//! # Eligible Credential Set
//!
//! The list of feed account ids (FIDs) whose holders may produce membership
//! proofs. Clients download it to build the membership tree locally; the
//! server never consults it when validating a submission.

use serde::{Deserialize, Serialize};

/// Sorted, de-duplicated list of eligible FIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct EligibleCredentialSet {
    fids: Vec<u64>,
}

impl EligibleCredentialSet {
    /// Build a set from any iterator of FIDs. Order and duplicates in the
    /// input do not matter.
    pub fn new(fids: impl IntoIterator<Item = u64>) -> Self {
        let mut fids: Vec<u64> = fids.into_iter().collect();
        fids.sort_unstable();
        fids.dedup();
        Self { fids }
    }

    /// Whether `fid` is eligible.
    pub fn contains(&self, fid: u64) -> bool {
        self.fids.binary_search(&fid).is_ok()
    }

    /// All eligible FIDs in ascending order.
    pub fn fids(&self) -> &[u64] {
        &self.fids
    }

    /// Number of eligible FIDs.
    pub fn len(&self) -> usize {
        self.fids.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fids.is_empty()
    }
}

impl From<Vec<u64>> for EligibleCredentialSet {
    fn from(fids: Vec<u64>) -> Self {
        Self::new(fids)
    }
}

impl From<EligibleCredentialSet> for Vec<u64> {
    fn from(set: EligibleCredentialSet) -> Self {
        set.fids
    }
}
