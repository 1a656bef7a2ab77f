//! # Application State
//!
//! Shared state handed to every handler. Everything here is either
//! immutable after startup or internally synchronized, so `AppState` is
//! cheap to clone.

use std::sync::Arc;

use anoncast_core::EligibleCredentialSet;
use anoncast_pipeline::MessagePipeline;
use zeroize::Zeroizing;

use crate::middleware::metrics::ApiMetrics;

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bearer token required on write routes. `None` disables auth.
    pub auth_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

impl AppConfig {
    /// Read `PORT` and `AUTH_TOKEN`. An unparsable port falls back to 8080.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let auth_token = std::env::var("AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        Self { port, auth_token }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<MessagePipeline>,
    pub eligibility: Arc<EligibleCredentialSet>,
    pub metrics: ApiMetrics,
    /// Present when `DATABASE_URL` was configured.
    pub db_pool: Option<sqlx::PgPool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("eligible_fids", &self.eligibility.len())
            .field("ready", &self.pipeline.is_ready())
            .field("db_pool", &self.db_pool.as_ref().map(|_| "[connected]"))
            .finish()
    }
}

impl AppState {
    /// Assemble state around a pipeline.
    pub fn new(
        config: AppConfig,
        pipeline: Arc<MessagePipeline>,
        eligibility: EligibleCredentialSet,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            config,
            pipeline,
            eligibility: Arc::new(eligibility),
            metrics: ApiMetrics::new()?,
            db_pool: None,
        })
    }

    /// Attach a database pool for readiness checks.
    pub fn with_db_pool(mut self, pool: Option<sqlx::PgPool>) -> Self {
        self.db_pool = pool;
        self
    }
}
