//! # anoncast-feed-client -- Typed Rust client for the Neynar Farcaster API
//!
//! Covers the two calls anoncast makes against the feed:
//! - **Lookup** of a cast by hash or URL, used to check reply targets.
//! - **Publish** of a cast through a managed signer.
//!
//! Read calls are repeated on transport failure and upstream overload.
//! Publication is sent once; a lost response means the cast may or may not
//! exist, and the caller must not resend it.

pub mod casts;
pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use config::FeedApiConfig;
pub use error::FeedApiError;
pub use types::{Cast, IdentifierType, PublishedCast};

use std::time::Duration;

/// Header carrying the Neynar API key.
const API_KEY_HEADER: &str = "api_key";

/// Top-level feed API client.
#[derive(Debug, Clone)]
pub struct FeedClient {
    casts: casts::CastClient,
}

impl FeedClient {
    /// Create a new client from configuration.
    pub fn new(config: FeedApiConfig) -> Result<Self, FeedApiError> {
        let mut api_key = reqwest::header::HeaderValue::from_str(config.api_key.as_str())
            .map_err(|_| FeedApiError::Config(config::ConfigError::MissingApiKey))?;
        api_key.set_sensitive(true);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(API_KEY_HEADER, api_key);
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| FeedApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let cast_url = config.endpoint(casts::CastClient::path());
        Ok(Self {
            casts: casts::CastClient::new(http, cast_url, config.signer_uuid),
        })
    }

    /// Access the cast endpoints.
    pub fn casts(&self) -> &casts::CastClient {
        &self.casts
    }
}
