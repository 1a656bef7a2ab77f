//! # Publication Gateway
//!
//! The single irreversible step. A gateway creates one post per call and
//! never retries internally: if the outcome of a call is unknown the
//! caller learns that through [`GatewayError::Ambiguous`] and must not
//! call again for the same submission.

use anoncast_core::{CastHash, ChannelId, ExternalHash};
use async_trait::async_trait;
use thiserror::Error;

/// What to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Post body.
    pub text: String,
    /// Post being replied to.
    pub parent: Option<CastHash>,
    /// Channel to post into.
    pub channel: Option<ChannelId>,
}

/// Publication failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The feed refused the post. Nothing was published.
    #[error("feed rejected the post (status {status}): {reason}")]
    Rejected {
        /// Status returned by the feed.
        status: u16,
        /// Detail from the feed.
        reason: String,
    },
    /// Timeout, transport failure or server error. The post may exist.
    #[error("publication outcome unknown: {0}")]
    Ambiguous(String),
}

/// One-shot publisher.
#[async_trait]
pub trait PublicationGateway: Send + Sync {
    /// Create a post and return its feed-assigned identifier.
    async fn publish(&self, request: &PublishRequest) -> Result<ExternalHash, GatewayError>;
}
