//! Message persistence on the `messages` table.
//!
//! Implements [`MessageStore`] so the pipeline can record publications and
//! detect replays against Postgres.

use anoncast_core::{CastHash, ChannelId, ExternalHash, MessageRecord, Submission};
use anoncast_pipeline::{MessageStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed message store.
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Escape `LIKE` metacharacters so a prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn save(&self, record: &MessageRecord) -> Result<(), StoreError> {
        let proof = serde_json::to_value(&record.proof)
            .map_err(|e| StoreError::Corrupt(format!("failed to serialize proof: {e}")))?;

        sqlx::query(
            "INSERT INTO messages (id, text, timestamp, external_hash, reply_to, channel, version,
                                   proof_digest, statement_digest, proof, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(record.id)
        .bind(&record.text)
        .bind(record.timestamp)
        .bind(record.external_hash.as_str())
        .bind(record.reply_to.map(|h| h.to_string()))
        .bind(record.channel.as_ref().map(|c| c.as_str().to_string()))
        .bind(record.version)
        .bind(&record.proof_digest)
        .bind(&record.statement_digest)
        .bind(&proof)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MessageRecord>, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, text, timestamp, external_hash, reply_to, channel, version,
                    proof_digest, statement_digest, proof, created_at
             FROM messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(MessageRow::into_record).transpose()
    }

    async fn find_by_external_hash(
        &self,
        prefix: &str,
    ) -> Result<Option<MessageRecord>, StoreError> {
        if prefix.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, text, timestamp, external_hash, reply_to, channel, version,
                    proof_digest, statement_digest, proof, created_at
             FROM messages WHERE external_hash LIKE $1
             ORDER BY created_at LIMIT 1",
        )
        .bind(like_prefix(prefix))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(MessageRow::into_record).transpose()
    }

    async fn find_by_digests(
        &self,
        proof_digest: &str,
        statement_digest: &str,
    ) -> Result<Option<MessageRecord>, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, text, timestamp, external_hash, reply_to, channel, version,
                    proof_digest, statement_digest, proof, created_at
             FROM messages WHERE proof_digest = $1 OR statement_digest = $2
             LIMIT 1",
        )
        .bind(proof_digest)
        .bind(statement_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(MessageRow::into_record).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    text: String,
    timestamp: DateTime<Utc>,
    external_hash: String,
    reply_to: Option<String>,
    channel: Option<String>,
    version: i32,
    proof_digest: String,
    statement_digest: String,
    proof: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_record(self) -> Result<MessageRecord, StoreError> {
        let id = self.id;
        let corrupt = move |field: &str, e: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("message {id}: invalid {field}: {e}"))
        };

        let external_hash =
            ExternalHash::new(self.external_hash).map_err(|e| corrupt("external_hash", &e))?;
        let reply_to = self
            .reply_to
            .as_deref()
            .map(str::parse::<CastHash>)
            .transpose()
            .map_err(|e| corrupt("reply_to", &e))?;
        let channel = self
            .channel
            .map(ChannelId::new)
            .transpose()
            .map_err(|e| corrupt("channel", &e))?;
        let proof: Submission =
            serde_json::from_value(self.proof).map_err(|e| corrupt("proof", &e))?;

        Ok(MessageRecord {
            id,
            text: self.text,
            timestamp: self.timestamp,
            external_hash,
            reply_to,
            channel,
            version: self.version,
            proof_digest: self.proof_digest,
            statement_digest: self.statement_digest,
            proof,
            created_at: self.created_at,
        })
    }
}
