//! # Message Store
//!
//! Durable record of what has been published. The pipeline consults it
//! before publishing (replay detection) and writes to it afterwards. The
//! HTTP layer reads it to serve message lookups.

use anoncast_core::MessageRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Storage failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend is unreachable or returned an error.
    #[error("message store unavailable: {0}")]
    Unavailable(String),
    /// A stored row could not be decoded.
    #[error("corrupt message record: {0}")]
    Corrupt(String),
}

/// Persistence for published messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a record.
    async fn save(&self, record: &MessageRecord) -> Result<(), StoreError>;

    /// Look up by record id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MessageRecord>, StoreError>;

    /// Look up by external hash. `prefix` may be a leading substring of
    /// the full hash, as shown in truncated feed URLs.
    async fn find_by_external_hash(&self, prefix: &str)
        -> Result<Option<MessageRecord>, StoreError>;

    /// Find a record matching either the proof digest or the statement
    /// digest.
    async fn find_by_digests(
        &self,
        proof_digest: &str,
        statement_digest: &str,
    ) -> Result<Option<MessageRecord>, StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    records: RwLock<Vec<MessageRecord>>,
}

impl InMemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn find(&self, pred: impl Fn(&MessageRecord) -> bool) -> Option<MessageRecord> {
        self.records.read().iter().find(|r| pred(r)).cloned()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, record: &MessageRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MessageRecord>, StoreError> {
        Ok(self.find(|r| r.id == id))
    }

    async fn find_by_external_hash(
        &self,
        prefix: &str,
    ) -> Result<Option<MessageRecord>, StoreError> {
        if prefix.is_empty() {
            return Ok(None);
        }
        Ok(self.find(|r| r.external_hash.as_str().starts_with(prefix)))
    }

    async fn find_by_digests(
        &self,
        proof_digest: &str,
        statement_digest: &str,
    ) -> Result<Option<MessageRecord>, StoreError> {
        Ok(self.find(|r| r.proof_digest == proof_digest || r.statement_digest == statement_digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anoncast_core::{DecodedInputs, ExternalHash, FieldElement, Submission};
    use chrono::Utc;

    fn record(hash: &str, proof: Vec<u8>) -> MessageRecord {
        let decoded = DecodedInputs {
            text: "hi".into(),
            timestamp_unix: 1_700_000_000,
            root: FieldElement::from_u64(1),
            reply_to: None,
            channel: None,
        };
        let submission = Submission::new(proof, vec![FieldElement::from_u64(1)]);
        MessageRecord::new(
            &decoded,
            &submission,
            ExternalHash::new(hash).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn finds_by_id_digest_and_hash_prefix() {
        let store = InMemoryMessageStore::new();
        let a = record("0xaaaa1111", vec![1]);
        let b = record("0xbbbb2222", vec![2]);
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        assert_eq!(store.find_by_id(a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(
            store.find_by_digests(&b.proof_digest, "00").await.unwrap(),
            Some(b.clone())
        );
        assert_eq!(
            store.find_by_external_hash("0xbbbb").await.unwrap(),
            Some(b)
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn misses_return_none() {
        let store = InMemoryMessageStore::new();
        store.save(&record("0xaaaa", vec![1])).await.unwrap();
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.find_by_external_hash("0xcc").await.unwrap().is_none());
        assert!(store.find_by_external_hash("").await.unwrap().is_none());
        assert!(store.find_by_digests("00", "00").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn statement_digest_matches_a_different_proof() {
        let store = InMemoryMessageStore::new();
        let stored = record("0xaaaa", vec![1]);
        store.save(&stored).await.unwrap();

        let other_proof = record("0xbbbb", vec![2]);
        assert_ne!(other_proof.proof_digest, stored.proof_digest);
        let found = store
            .find_by_digests(&other_proof.proof_digest, &other_proof.statement_digest)
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(stored.id));
    }
}
