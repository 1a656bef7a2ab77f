//! Request and response types for the Neynar v2 cast endpoints.
//!
//! Response structs use `#[serde(default)]` generously; the live API adds
//! fields freely and unknown ones are ignored.

use serde::{Deserialize, Serialize};

/// How a cast is identified in a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    /// `0x`-prefixed cast hash.
    Hash,
    /// Warpcast URL of the cast.
    Url,
}

impl IdentifierType {
    /// Query-string value.
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierType::Hash => "hash",
            IdentifierType::Url => "url",
        }
    }
}

/// Author of a cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastAuthor {
    /// Farcaster account id.
    pub fid: u64,
    /// Handle, if present.
    #[serde(default)]
    pub username: Option<String>,
}

/// A cast as returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cast {
    /// Cast hash.
    pub hash: String,
    /// Author, when returned.
    #[serde(default)]
    pub author: Option<CastAuthor>,
    /// Cast body.
    #[serde(default)]
    pub text: String,
    /// Hash of the cast this one replies to.
    #[serde(default)]
    pub parent_hash: Option<String>,
    /// Creation time as reported by the API.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Envelope of `GET /v2/farcaster/cast`.
#[derive(Debug, Clone, Deserialize)]
pub struct CastLookupResponse {
    /// The cast.
    pub cast: Cast,
}

/// Body of `POST /v2/farcaster/cast`.
#[derive(Debug, Clone, Serialize)]
pub struct PublishCastRequest<'a> {
    /// Managed signer authoring the cast.
    pub signer_uuid: &'a str,
    /// Cast body.
    pub text: &'a str,
    /// Hash of the cast being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<&'a str>,
    /// Channel to post into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<&'a str>,
}

/// Cast returned from a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedCast {
    /// Hash assigned to the new cast.
    pub hash: String,
    /// Echoed body.
    #[serde(default)]
    pub text: Option<String>,
}

/// Envelope of a publish response.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishCastResponse {
    /// Whether the API reports success.
    #[serde(default = "default_success")]
    pub success: bool,
    /// The new cast.
    pub cast: PublishedCast,
}

fn default_success() -> bool {
    true
}
