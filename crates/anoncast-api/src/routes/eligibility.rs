//! # Eligibility API
//!
//! Read-only view of the FIDs allowed to post. Clients fetch the list to
//! build the membership tree their proofs are generated against. The list
//! is loaded once at startup and does not take part in verification.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Full eligibility list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EligibilityListResponse {
    /// Eligible FIDs in ascending order.
    pub fids: Vec<u64>,
    pub count: usize,
}

/// Membership of a single FID.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EligibilityCheckResponse {
    pub fid: u64,
    pub eligible: bool,
}

/// Build the eligibility router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/eligibility", get(list_eligible))
        .route("/v1/eligibility/:fid", get(check_eligible))
}

/// GET /v1/eligibility: List eligible FIDs.
#[utoipa::path(
    get,
    path = "/v1/eligibility",
    responses(
        (status = 200, description = "Eligible FIDs", body = EligibilityListResponse),
    ),
    tag = "eligibility"
)]
pub(crate) async fn list_eligible(State(state): State<AppState>) -> Json<EligibilityListResponse> {
    Json(EligibilityListResponse {
        fids: state.eligibility.fids().to_vec(),
        count: state.eligibility.len(),
    })
}

/// GET /v1/eligibility/:fid: Check one FID.
#[utoipa::path(
    get,
    path = "/v1/eligibility/{fid}",
    params(("fid" = u64, Path, description = "Farcaster account id")),
    responses(
        (status = 200, description = "Membership result", body = EligibilityCheckResponse),
    ),
    tag = "eligibility"
)]
pub(crate) async fn check_eligible(
    State(state): State<AppState>,
    Path(fid): Path<u64>,
) -> Json<EligibilityCheckResponse> {
    Json(EligibilityCheckResponse {
        fid,
        eligible: state.eligibility.contains(fid),
    })
}
