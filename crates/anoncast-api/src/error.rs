//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps pipeline outcomes and storage failures to HTTP status codes with
//! JSON bodies of the form `{ "error": { "code", "message" } }`.
//! Infrastructure details are logged and never returned to the client.

use anoncast_pipeline::{ErrorKind, PipelineError, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "STALE_PROOF", "NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Generic message returned in place of infrastructure details.
const UNAVAILABLE_MESSAGE: &str = "The service is temporarily unable to process this request";

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The submission was refused or could not be processed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// A backing service is unavailable (503). Message is logged, not returned.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Pipeline(e) => (pipeline_status(e.kind), e.kind.code()),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_opaque(&self) -> bool {
        match self {
            Self::Internal(_) | Self::ServiceUnavailable(_) => true,
            Self::Pipeline(e) => e.kind == ErrorKind::InfrastructureFault,
            _ => false,
        }
    }
}

fn pipeline_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::DecodeError => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidRoot
        | ErrorKind::StaleProof
        | ErrorKind::ProofInvalid
        | ErrorKind::ReplyTargetUnresolved => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ReplayDetected => StatusCode::CONFLICT,
        ErrorKind::InfrastructureFault => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_opaque() {
            tracing::error!(error = %self, "request failed on backing service");
            match &self {
                Self::Internal(_) => "An internal error occurred".to_string(),
                _ => UNAVAILABLE_MESSAGE.to_string(),
            }
        } else {
            match &self {
                Self::Pipeline(e) => e.reason.clone(),
                other => other.to_string(),
            }
        };

        let details = match &self {
            Self::Pipeline(e) if !self.is_opaque() => {
                Some(serde_json::json!({ "stage": e.stage.name() }))
            }
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            StoreError::Corrupt(_) => Self::Internal(err.to_string()),
        }
    }
}
