//! # Published Messages
//!
//! [`PublicationResult`] is what a client receives after a successful
//! submission; [`MessageRecord`] is what gets persisted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::field::{CastHash, ChannelId};
use crate::inputs::{DecodedInputs, Submission};
use crate::temporal::{datetime_from_unix, iso8601_from_unix};

/// Schema version stamped on every stored message.
pub const MESSAGE_VERSION: i32 = 1;

/// Identifier the feed assigned to a published post. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalHash(String);

impl ExternalHash {
    /// Validate and wrap a feed-assigned identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyExternalHash);
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CastHash> for ExternalHash {
    fn from(hash: CastHash) -> Self {
        Self(hash.to_string())
    }
}

impl TryFrom<String> for ExternalHash {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ExternalHash> for String {
    fn from(h: ExternalHash) -> Self {
        h.0
    }
}

impl fmt::Display for ExternalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response body for a successful publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResult {
    /// Feed-assigned identifier of the new post.
    pub external_hash: ExternalHash,
    /// Proof timestamp as ISO 8601 with milliseconds.
    pub timestamp: String,
    /// Cast replied to, `null` when the post is top-level.
    pub reply_to: Option<String>,
}

impl PublicationResult {
    /// Build the response from what was decoded and what the feed returned.
    ///
    /// `decoded.timestamp_unix` must be in chrono's representable range,
    /// which holds for anything produced by the decoder.
    pub fn new(decoded: &DecodedInputs, external_hash: ExternalHash) -> Self {
        let timestamp = iso8601_from_unix(decoded.timestamp_unix).unwrap_or_default();
        Self {
            external_hash,
            timestamp,
            reply_to: decoded.reply_to.map(|h| h.to_string()),
        }
    }
}

/// Persisted form of a published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Message body.
    pub text: String,
    /// Proof creation time.
    pub timestamp: DateTime<Utc>,
    /// Feed-assigned identifier.
    pub external_hash: ExternalHash,
    /// Cast replied to.
    pub reply_to: Option<CastHash>,
    /// Channel posted into.
    pub channel: Option<ChannelId>,
    /// Record schema version.
    pub version: i32,
    /// SHA-256 of the proof bytes.
    pub proof_digest: String,
    /// SHA-256 of the public inputs. Replays are refused on either digest.
    pub statement_digest: String,
    /// The submission as received.
    pub proof: Submission,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Assemble a record for a freshly published message.
    pub fn new(
        decoded: &DecodedInputs,
        submission: &Submission,
        external_hash: ExternalHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: decoded.text.clone(),
            timestamp: datetime_from_unix(decoded.timestamp_unix).unwrap_or(created_at),
            external_hash,
            reply_to: decoded.reply_to,
            channel: decoded.channel.clone(),
            version: MESSAGE_VERSION,
            proof_digest: submission.proof_digest(),
            statement_digest: submission.statement_digest(),
            proof: submission.clone(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;

    fn decoded(reply: Option<CastHash>) -> DecodedInputs {
        DecodedInputs {
            text: "hello".into(),
            timestamp_unix: 1_714_564_800,
            root: FieldElement::from_u64(1),
            reply_to: reply,
            channel: None,
        }
    }

    #[test]
    fn publication_result_serializes_null_reply() {
        let result = PublicationResult::new(&decoded(None), ExternalHash::new("0xabc").unwrap());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["externalHash"], "0xabc");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00.000Z");
        assert!(json["replyTo"].is_null());
    }

    #[test]
    fn publication_result_carries_reply_hash() {
        let parent: CastHash = "0x00112233445566778899aabbccddeeff00112233".parse().unwrap();
        let result =
            PublicationResult::new(&decoded(Some(parent)), ExternalHash::new("0xabc").unwrap());
        assert_eq!(
            result.reply_to.as_deref(),
            Some("0x00112233445566778899aabbccddeeff00112233")
        );
    }

    #[test]
    fn external_hash_rejects_empty() {
        assert_eq!(ExternalHash::new("  "), Err(ValidationError::EmptyExternalHash));
        assert!(serde_json::from_str::<ExternalHash>("\"\"").is_err());
    }

    #[test]
    fn record_stamps_version_and_digest() {
        let submission = Submission::new(vec![9, 9], vec![FieldElement::from_u64(1)]);
        let record = MessageRecord::new(
            &decoded(None),
            &submission,
            ExternalHash::new("0xfeed").unwrap(),
            Utc::now(),
        );
        assert_eq!(record.version, MESSAGE_VERSION);
        assert_eq!(record.proof_digest, submission.proof_digest());
        assert_eq!(record.statement_digest, submission.statement_digest());
        assert_eq!(record.timestamp.timestamp(), 1_714_564_800);
    }
}
