//! Feed API client error types.

/// Errors from feed API calls.
#[derive(Debug, thiserror::Error)]
pub enum FeedApiError {
    /// HTTP transport error (connect failure, timeout, reset).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Method and path that failed.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The API returned a non-2xx status.
    #[error("feed API {endpoint} returned {status}: {body}")]
    ApiError {
        /// Method and path that failed.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Method and path that failed.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl FeedApiError {
    /// Whether the API definitively refused the request (4xx).
    ///
    /// Everything else leaves the remote side effect unknown.
    pub fn is_rejection(&self) -> bool {
        matches!(self, FeedApiError::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Status code, if the API answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FeedApiError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
