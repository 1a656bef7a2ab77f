//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "anoncast API",
        version = "0.1.0",
        description = "Anonymous, proof-gated publication to Farcaster. Members of an eligible set submit a zero-knowledge membership proof with their message; the service verifies it and posts the message from a shared account.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::messages::submit_message,
        crate::routes::messages::get_message,
        crate::routes::messages::get_message_by_hash,
        crate::routes::eligibility::list_eligible,
        crate::routes::eligibility::check_eligible,
        crate::routes::roots::list_roots,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::messages::SubmitMessageRequest,
        crate::routes::messages::PublicationResponse,
        crate::routes::messages::MessageResponse,
        crate::routes::eligibility::EligibilityListResponse,
        crate::routes::eligibility::EligibilityCheckResponse,
        crate::routes::roots::RootsResponse,
    )),
    tags(
        (name = "messages", description = "Anonymous submission and message lookup"),
        (name = "eligibility", description = "Eligible account list"),
        (name = "roots", description = "Accepted membership roots"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
