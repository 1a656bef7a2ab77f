//! # Roots API
//!
//! Publishes the membership roots the service currently accepts.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Accepted membership roots.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootsResponse {
    /// Root of the latest membership tree, hex.
    pub current: String,
    /// Earlier roots that remain valid, hex.
    pub legacy: Vec<String>,
}

/// Build the roots router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/roots", get(list_roots))
}

/// GET /v1/roots: Current and legacy membership roots.
#[utoipa::path(
    get,
    path = "/v1/roots",
    responses(
        (status = 200, description = "Accepted roots", body = RootsResponse),
        (status = 503, description = "Roots not loaded", body = crate::error::ErrorBody),
    ),
    tag = "roots"
)]
pub(crate) async fn list_roots(State(state): State<AppState>) -> Result<Json<RootsResponse>, AppError> {
    let snapshot = state
        .pipeline
        .registry()
        .snapshot()
        .ok_or_else(|| AppError::ServiceUnavailable("root registry not loaded".into()))?;
    Ok(Json(RootsResponse {
        current: snapshot.current.to_string(),
        legacy: snapshot.legacy.iter().map(ToString::to_string).collect(),
    }))
}
