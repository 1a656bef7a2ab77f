//! # Messages API
//!
//! Anonymous submission and lookup of published messages.
//!
//! `POST /v1/messages` hands the submission to the pipeline and answers
//! `201` with the publication result. Every refusal carries the pipeline's
//! error code; see [`AppError`] for the status mapping.

use std::str::FromStr;

use anoncast_core::field::hex_decode;
use anoncast_core::temporal::format_iso8601;
use anoncast_core::{FieldElement, MessageRecord, PublicationResult, Submission};
use anoncast_pipeline::{ErrorKind, PipelineError, PipelineStage};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Upper bound on public inputs accepted in one request.
const MAX_PUBLIC_INPUTS: usize = 1024;

/// Upper bound on proof size in bytes.
const MAX_PROOF_BYTES: usize = 64 * 1024;

/// Anonymous message submission.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMessageRequest {
    /// Proof bytes, hex encoded.
    pub proof: String,
    /// Public inputs the proof commits to, each a hex field element.
    pub public_inputs: Vec<String>,
}

impl Validate for SubmitMessageRequest {
    fn validate(&self) -> Result<(), String> {
        if self.proof.trim().is_empty() {
            return Err("proof must not be empty".into());
        }
        // Two hex digits per byte, plus an optional prefix.
        if self.proof.len() > MAX_PROOF_BYTES * 2 + 2 {
            return Err(format!("proof exceeds {MAX_PROOF_BYTES} bytes"));
        }
        if self.public_inputs.len() > MAX_PUBLIC_INPUTS {
            return Err(format!(
                "at most {MAX_PUBLIC_INPUTS} public inputs are accepted"
            ));
        }
        Ok(())
    }
}

impl SubmitMessageRequest {
    /// Unparsable proof bytes or public inputs are decode errors, the same
    /// as inputs the pipeline cannot decode.
    fn into_submission(self) -> Result<Submission, PipelineError> {
        let undecodable = |reason: String| {
            PipelineError::new(ErrorKind::DecodeError, reason, PipelineStage::Received)
        };
        let proof = hex_decode(&self.proof).map_err(|e| undecodable(format!("proof: {e}")))?;
        let public_inputs = self
            .public_inputs
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                FieldElement::from_str(raw)
                    .map_err(|e| undecodable(format!("publicInputs[{i}]: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Submission::new(proof, public_inputs))
    }
}

/// Result of a successful publication.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResponse {
    /// Feed-assigned hash of the new post.
    pub external_hash: String,
    /// Proof timestamp, ISO 8601 with milliseconds.
    pub timestamp: String,
    /// Hash of the post replied to, `null` for top-level posts.
    pub reply_to: Option<String>,
}

impl From<PublicationResult> for PublicationResponse {
    fn from(r: PublicationResult) -> Self {
        Self {
            external_hash: r.external_hash.to_string(),
            timestamp: r.timestamp,
            reply_to: r.reply_to,
        }
    }
}

/// A stored message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub text: String,
    /// Proof timestamp, ISO 8601 with milliseconds.
    pub timestamp: String,
    pub external_hash: String,
    pub reply_to: Option<String>,
    pub channel: Option<String>,
    pub version: i32,
    /// SHA-256 of the proof bytes.
    pub proof_digest: String,
    pub created_at: String,
}

impl From<MessageRecord> for MessageResponse {
    fn from(r: MessageRecord) -> Self {
        Self {
            id: r.id,
            text: r.text,
            timestamp: format_iso8601(&r.timestamp),
            external_hash: r.external_hash.to_string(),
            reply_to: r.reply_to.map(|h| h.to_string()),
            channel: r.channel.map(String::from),
            version: r.version,
            proof_digest: r.proof_digest,
            created_at: format_iso8601(&r.created_at),
        }
    }
}

/// Build the messages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/messages", post(submit_message))
        .route("/v1/messages/:id", get(get_message))
        .route("/v1/messages/hash/:hash", get(get_message_by_hash))
}

/// POST /v1/messages: Submit an anonymous message.
#[utoipa::path(
    post,
    path = "/v1/messages",
    request_body = SubmitMessageRequest,
    responses(
        (status = 201, description = "Message published", body = PublicationResponse),
        (status = 400, description = "Malformed submission", body = crate::error::ErrorBody),
        (status = 409, description = "Proof already used", body = crate::error::ErrorBody),
        (status = 422, description = "Submission refused", body = crate::error::ErrorBody),
        (status = 503, description = "Infrastructure fault", body = crate::error::ErrorBody),
    ),
    tag = "messages"
)]
pub(crate) async fn submit_message(
    State(state): State<AppState>,
    body: Result<Json<SubmitMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicationResponse>), AppError> {
    let outcome = match extract_validated_json(body)?.into_submission() {
        Ok(submission) => state.pipeline.submit(submission).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            state.metrics.record_submission("published");
            Ok((StatusCode::CREATED, Json(result.into())))
        }
        Err(e) => {
            state.metrics.record_submission(e.kind.code());
            Err(e.into())
        }
    }
}

/// GET /v1/messages/:id: Fetch a published message by record id.
#[utoipa::path(
    get,
    path = "/v1/messages/{id}",
    params(("id" = Uuid, Path, description = "Message record id")),
    responses(
        (status = 200, description = "Message found", body = MessageResponse),
        (status = 404, description = "No such message", body = crate::error::ErrorBody),
    ),
    tag = "messages"
)]
pub(crate) async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .pipeline
        .store()
        .find_by_id(id)
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound(format!("message {id}")))
}

/// GET /v1/messages/hash/:hash: Fetch a published message by feed hash.
///
/// Accepts a prefix of the hash, as shown in truncated feed URLs.
#[utoipa::path(
    get,
    path = "/v1/messages/hash/{hash}",
    params(("hash" = String, Path, description = "Feed hash or a prefix of it")),
    responses(
        (status = 200, description = "Message found", body = MessageResponse),
        (status = 404, description = "No such message", body = crate::error::ErrorBody),
    ),
    tag = "messages"
)]
pub(crate) async fn get_message_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .pipeline
        .store()
        .find_by_external_hash(&hash)
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound(format!("message with hash {hash}")))
}
