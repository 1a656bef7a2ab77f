//! # anoncast-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use anoncast_api::bootstrap::StartupError;
use anoncast_api::state::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    init_tracing();
    let result = run().await;
    if let Err(e) = &result {
        tracing::error!("{e}");
    }
    result
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env();
    let port = config.port;

    // Optional: absent DATABASE_URL means in-memory only.
    let db_pool = anoncast_api::db::init_pool().await?;
    let state = anoncast_api::bootstrap::bootstrap(config, db_pool).await?;

    let _refresh = anoncast_api::bootstrap::spawn_root_refresh(state.pipeline.registry().clone());

    let app = anoncast_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!("anoncast API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    Ok(())
}

/// Structured logs; JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
