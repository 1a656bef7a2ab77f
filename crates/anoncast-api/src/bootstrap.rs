//! # Service Bootstrap
//!
//! Builds the application state from the environment at startup.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Roots**: from `ANONCAST_ROOTS_FILE`, or from
//!    `ANONCAST_CURRENT_ROOT` plus `ANONCAST_LEGACY_ROOTS`.
//! 2. **Prepare Verifier**: load the circuit artifact, check the backend
//!    against the proof policy, derive the verifying key.
//! 3. **Connect Feed**: Neynar client for reply lookups and publication.
//! 4. **Select Store**: Postgres when a pool is given, in-memory otherwise.
//! 5. **Load Eligibility List**: optional JSON array of FIDs.
//! 6. **Log Service Identity**: structured startup banner.
//!
//! Any failure aborts startup. A service that cannot verify proofs or
//! does not know its roots must not accept submissions.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anoncast_core::{EligibleCredentialSet, FieldElement};
use anoncast_feed_client::{FeedApiConfig, FeedApiError, FeedClient};
use anoncast_pipeline::{
    FileRootSource, InMemoryMessageStore, MessagePipeline, MessageStore, PipelineConfig,
    RootRegistry, RootSnapshot, RootSource, RootSourceError, StaticRootSource,
    SubmissionValidator,
};
use anoncast_zkp::{
    CircuitArtifact, MockProofSystem, PolicyError, ProofPolicy, ProofVerifier, SetupError,
    SubmissionVerifier, VerifierFault,
};
use tokio::task::JoinHandle;

use crate::adapters::{FeedPublicationGateway, FeedReplyLookup};
use crate::db::messages::PgMessageStore;
use crate::state::{AppConfig, AppState};

/// Default interval between root refreshes for file-backed roots.
pub const DEFAULT_ROOTS_REFRESH_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during service bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Root configuration is missing or unparsable.
    #[error("root configuration: {0}")]
    RootConfig(String),

    /// The configured root source could not be loaded.
    #[error("failed to load membership roots: {0}")]
    Roots(#[from] RootSourceError),

    /// Circuit artifact could not be read.
    #[error("circuit artifact: {0}")]
    Circuit(#[from] SetupError),

    /// The proof backend is not allowed by the active policy.
    #[error("proof policy: {0}")]
    Policy(#[from] PolicyError),

    /// Verifying key derivation failed.
    #[error("verifier setup failed: {0}")]
    Verifier(#[from] VerifierFault),

    /// Feed API configuration is incomplete.
    #[error("feed API configuration: {0}")]
    FeedConfig(#[from] anoncast_feed_client::config::ConfigError),

    /// Feed client could not be constructed.
    #[error("feed API client: {0}")]
    Feed(#[from] FeedApiError),

    /// Pipeline settings are invalid.
    #[error("pipeline configuration: {0}")]
    PipelineConfig(#[from] anoncast_pipeline::config::ConfigError),

    /// Eligibility list could not be read.
    #[error("eligibility list {path}: {reason}")]
    Eligibility { path: String, reason: String },

    /// Metrics registry could not be built.
    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Fatal errors in the `anoncast-api` binary, from startup to shutdown.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database initialization failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Bootstrap the application state from environment variables.
pub async fn bootstrap(
    config: AppConfig,
    db_pool: Option<sqlx::PgPool>,
) -> Result<AppState, BootstrapError> {
    let roots_file = env_nonempty("ANONCAST_ROOTS_FILE").map(PathBuf::from);
    let source = root_source(
        roots_file.as_deref(),
        env_nonempty("ANONCAST_CURRENT_ROOT").as_deref(),
        env_nonempty("ANONCAST_LEGACY_ROOTS").as_deref(),
    )?;
    let registry = Arc::new(RootRegistry::load(source).await?);

    let circuit = load_circuit(env_nonempty("ANONCAST_CIRCUIT_PATH").as_deref().map(Path::new))?;
    let policy = ProofPolicy::from_environment()?;
    let verifier = ProofVerifier::with_policy(MockProofSystem, circuit, &policy)?;
    verifier.prepare().await?;

    let feed = Arc::new(FeedClient::new(FeedApiConfig::from_env()?)?);
    let pipeline_config = PipelineConfig::from_env()?;

    let store: Arc<dyn MessageStore> = match &db_pool {
        Some(pool) => Arc::new(PgMessageStore::new(pool.clone())),
        None => Arc::new(InMemoryMessageStore::new()),
    };

    let eligibility_path = env_nonempty("ANONCAST_ELIGIBLE_FIDS_FILE").map(PathBuf::from);
    let eligibility = load_eligibility(eligibility_path.as_deref()).await?;

    let validator = SubmissionValidator::new(
        registry,
        Arc::new(FeedReplyLookup::new(feed.clone())),
        pipeline_config,
    );
    let pipeline = MessagePipeline::new(
        validator,
        Arc::new(verifier),
        Arc::new(FeedPublicationGateway::new(feed)),
        store,
    );

    log_banner(&config, &policy, &pipeline_config, &pipeline, &eligibility, db_pool.is_some());

    Ok(AppState::new(config, Arc::new(pipeline), eligibility)?.with_db_pool(db_pool))
}

/// Re-read roots periodically when they come from a file.
///
/// Returns `None` for statically configured roots, which never change.
pub fn spawn_root_refresh(registry: Arc<RootRegistry>) -> Option<JoinHandle<()>> {
    env_nonempty("ANONCAST_ROOTS_FILE")?;
    let secs = env_nonempty("ANONCAST_ROOTS_REFRESH_SECS")
        .and_then(|s| s.parse().ok())
        .filter(|s: &u64| *s > 0)
        .unwrap_or(DEFAULT_ROOTS_REFRESH_SECS);

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.tick().await;
        loop {
            interval.tick().await;
            // Failures are logged by the registry, which keeps its last good roots.
            let _ = registry.refresh().await;
        }
    }))
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Choose the root source. A roots file takes precedence over inline roots.
pub fn root_source(
    roots_file: Option<&Path>,
    current: Option<&str>,
    legacy: Option<&str>,
) -> Result<Arc<dyn RootSource>, BootstrapError> {
    if let Some(path) = roots_file {
        if current.is_some() {
            tracing::warn!(
                path = %path.display(),
                "both ANONCAST_ROOTS_FILE and ANONCAST_CURRENT_ROOT set; using the file"
            );
        }
        return Ok(Arc::new(FileRootSource::new(path)));
    }

    let current = current.ok_or_else(|| {
        BootstrapError::RootConfig(
            "set ANONCAST_ROOTS_FILE or ANONCAST_CURRENT_ROOT".to_string(),
        )
    })?;
    let current: FieldElement = current
        .trim()
        .parse()
        .map_err(|e| BootstrapError::RootConfig(format!("ANONCAST_CURRENT_ROOT: {e}")))?;
    let legacy = parse_root_list(legacy.unwrap_or_default())?;

    Ok(Arc::new(StaticRootSource::new(RootSnapshot { current, legacy })))
}

/// Parse a comma-separated list of hex roots. Empty entries are skipped.
pub fn parse_root_list(raw: &str) -> Result<Vec<FieldElement>, BootstrapError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|e| BootstrapError::RootConfig(format!("ANONCAST_LEGACY_ROOTS: {e}")))
        })
        .collect()
}

fn load_circuit(path: Option<&Path>) -> Result<CircuitArtifact, BootstrapError> {
    match path {
        Some(path) => {
            let circuit = CircuitArtifact::from_path(path)?;
            tracing::info!(path = %path.display(), noir_version = %circuit.noir_version, "circuit artifact loaded");
            Ok(circuit)
        }
        None => {
            tracing::warn!("ANONCAST_CIRCUIT_PATH not set; using the development circuit");
            Ok(CircuitArtifact::development())
        }
    }
}

/// Read a JSON array of FIDs. No path means an empty list.
pub async fn load_eligibility(path: Option<&Path>) -> Result<EligibleCredentialSet, BootstrapError> {
    let Some(path) = path else {
        tracing::warn!("ANONCAST_ELIGIBLE_FIDS_FILE not set; eligibility list is empty");
        return Ok(EligibleCredentialSet::default());
    };
    let err = |reason: String| BootstrapError::Eligibility {
        path: path.display().to_string(),
        reason,
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| err(e.to_string()))?;
    let fids: Vec<u64> = serde_json::from_str(&raw).map_err(|e| err(e.to_string()))?;
    Ok(EligibleCredentialSet::new(fids))
}

fn log_banner(
    config: &AppConfig,
    policy: &ProofPolicy,
    pipeline_config: &PipelineConfig,
    pipeline: &MessagePipeline,
    eligibility: &EligibleCredentialSet,
    persistent: bool,
) {
    let roots = pipeline
        .registry()
        .snapshot()
        .map(|s| 1 + s.legacy.len())
        .unwrap_or(0);
    tracing::info!(
        port = config.port,
        auth = config.auth_token.is_some(),
        proof_backend = %pipeline.verifier().backend(),
        proof_policy = ?policy.mode(),
        roots,
        freshness_window_secs = pipeline_config.freshness_window_secs,
        reply_policy = %pipeline_config.reply_policy,
        eligible_fids = eligibility.len(),
        store = if persistent { "postgres" } else { "memory" },
        "anoncast service configured"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_name_their_cause() {
        let err: StartupError = BootstrapError::RootConfig("no current root".into()).into();
        assert_eq!(
            err.to_string(),
            "bootstrap failed: root configuration: no current root"
        );

        let err = StartupError::Bind {
            addr: std::net::SocketAddr::from(([0, 0, 0, 0], 8080)),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.to_string(), "failed to bind 0.0.0.0:8080: address in use");
    }

    #[test]
    fn inline_roots_parse() {
        let legacy = parse_root_list("0x01, 0x02,,0x03 ").unwrap();
        assert_eq!(
            legacy,
            vec![
                FieldElement::from_u64(1),
                FieldElement::from_u64(2),
                FieldElement::from_u64(3)
            ]
        );
    }

    #[test]
    fn bad_legacy_root_is_config_error() {
        assert!(matches!(
            parse_root_list("0x01,nothex"),
            Err(BootstrapError::RootConfig(_))
        ));
    }

    #[test]
    fn missing_roots_are_config_error() {
        assert!(matches!(
            root_source(None, None, None),
            Err(BootstrapError::RootConfig(_))
        ));
    }

    #[tokio::test]
    async fn static_source_serves_configured_roots() {
        let source = root_source(None, Some("0x05"), Some("0x04,0x03")).unwrap();
        let snapshot = source.load().await.unwrap();
        assert_eq!(snapshot.current, FieldElement::from_u64(5));
        assert_eq!(snapshot.legacy.len(), 2);
    }

    #[tokio::test]
    async fn roots_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        std::fs::write(&path, r#"{"current": "0x09", "legacy": ["0x08"]}"#).unwrap();

        let source = root_source(Some(&path), Some("0x05"), None).unwrap();
        let snapshot = source.load().await.unwrap();
        assert_eq!(snapshot.current, FieldElement::from_u64(9));
    }

    #[tokio::test]
    async fn eligibility_file_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fids.json");
        std::fs::write(&path, "[30, 10, 20, 10]").unwrap();

        let set = load_eligibility(Some(&path)).await.unwrap();
        assert_eq!(set.fids(), &[10, 20, 30]);
    }

    #[tokio::test]
    async fn eligibility_absent_is_empty() {
        assert!(load_eligibility(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_eligibility_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fids.json");
        std::fs::write(&path, r#"{"fids": [1]}"#).unwrap();
        assert!(matches!(
            load_eligibility(Some(&path)).await,
            Err(BootstrapError::Eligibility { .. })
        ));
    }

    #[test]
    fn development_circuit_without_path() {
        let circuit = load_circuit(None).unwrap();
        assert!(circuit.validate().is_ok());
    }
}
