//! # anoncast-api: HTTP Service
//!
//! Accepts anonymous message submissions, runs them through the
//! proof-gated pipeline and serves the read-only data clients need to
//! build proofs.
//!
//! ## API Surface
//!
//! | Route                          | Module                    |
//! |--------------------------------|---------------------------|
//! | `POST /v1/messages`            | [`routes::messages`]      |
//! | `GET /v1/messages/:id`         | [`routes::messages`]      |
//! | `GET /v1/messages/hash/:hash`  | [`routes::messages`]      |
//! | `GET /v1/eligibility[/:fid]`   | [`routes::eligibility`]   |
//! | `GET /v1/roots`                | [`routes::roots`]         |
//! | `GET /openapi.json`            | [`openapi`]               |
//! | `GET /health/*`, `GET /metrics`| this module               |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod adapters;
pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Request body limit. Proofs are a few kilobytes.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware so
/// they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::messages::router())
        .merge(routes::eligibility::router())
        .merge(routes::roots::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(state.metrics.clone()))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe: 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once roots are loaded and the verifier is prepared.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if !state.pipeline.registry().is_loaded() {
        return (StatusCode::SERVICE_UNAVAILABLE, "roots not loaded").into_response();
    }
    if !state.pipeline.verifier().is_prepared() {
        return (StatusCode::SERVICE_UNAVAILABLE, "verifier not prepared").into_response();
    }
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Refreshes the registry gauges from current state, then encodes every
/// metric in the text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = &state.metrics;
    let roots = state
        .pipeline
        .registry()
        .snapshot()
        .map(|s| 1 + s.legacy.len())
        .unwrap_or(0);
    metrics.known_roots().set(roots as f64);
    metrics.eligible_fids().set(state.eligibility.len() as f64);
    metrics
        .ready()
        .set(if state.pipeline.is_ready() { 1.0 } else { 0.0 });

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("metrics encoding failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
