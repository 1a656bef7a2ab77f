//! Configuration for the Neynar feed API client.

use url::Url;
use zeroize::Zeroizing;

/// Default Neynar API host.
pub const DEFAULT_BASE_URL: &str = "https://api.neynar.com";

/// Connection settings for the feed API.
///
/// The API key and signer UUID are held in [`Zeroizing`] buffers and
/// redacted from `Debug` output.
#[derive(Clone)]
pub struct FeedApiConfig {
    /// API host, e.g. `https://api.neynar.com`.
    pub base_url: Url,
    /// Neynar API key, sent on every request.
    pub api_key: Zeroizing<String>,
    /// Managed signer that authors anonymous casts.
    pub signer_uuid: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FeedApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("signer_uuid", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FeedApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NEYNAR_API_KEY` (required)
    /// - `NEYNAR_SIGNER_UUID` (required)
    /// - `NEYNAR_BASE_URL` (default: `https://api.neynar.com`)
    /// - `NEYNAR_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = required("NEYNAR_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let signer_uuid = required("NEYNAR_SIGNER_UUID").ok_or(ConfigError::MissingSignerUuid)?;

        Ok(Self {
            base_url: env_url("NEYNAR_BASE_URL", DEFAULT_BASE_URL)?,
            api_key: Zeroizing::new(api_key),
            signer_uuid: Zeroizing::new(signer_uuid),
            timeout_secs: std::env::var("NEYNAR_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            api_key: Zeroizing::new(api_key.to_string()),
            signer_uuid: Zeroizing::new("test-signer".to_string()),
            timeout_secs: 5,
        })
    }

    /// Join `path` onto the base URL, tolerating a trailing slash on either.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn required(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `NEYNAR_API_KEY` is unset or empty.
    #[error("NEYNAR_API_KEY environment variable is required")]
    MissingApiKey,
    /// `NEYNAR_SIGNER_UUID` is unset or empty.
    #[error("NEYNAR_SIGNER_UUID environment variable is required")]
    MissingSignerUuid,
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
