//! Typed client for the Neynar v2 cast endpoints.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/v2/farcaster/cast?identifier=..&type=..` | Look up one cast |
//! | POST   | `/v2/farcaster/cast` | Publish a cast |
//!
//! Lookups are repeated on transport failure and on upstream overload.
//! Publishing sends exactly one request.

use zeroize::Zeroizing;

use crate::error::FeedApiError;
use crate::retry::{send_idempotent, Backoff};
use crate::types::{
    Cast, CastLookupResponse, IdentifierType, PublishCastRequest, PublishCastResponse,
    PublishedCast,
};

const CAST_PATH: &str = "v2/farcaster/cast";

/// Client for cast lookup and publication.
#[derive(Clone)]
pub struct CastClient {
    http: reqwest::Client,
    cast_url: String,
    signer_uuid: Zeroizing<String>,
}

impl std::fmt::Debug for CastClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastClient")
            .field("cast_url", &self.cast_url)
            .field("signer_uuid", &"[REDACTED]")
            .finish()
    }
}

impl CastClient {
    pub(crate) fn new(http: reqwest::Client, cast_url: String, signer_uuid: Zeroizing<String>) -> Self {
        Self {
            http,
            cast_url,
            signer_uuid,
        }
    }

    pub(crate) fn path() -> &'static str {
        CAST_PATH
    }

    /// Look up a cast.
    ///
    /// Calls `GET {base_url}/v2/farcaster/cast`. Returns `Ok(None)` when the
    /// API answers 404.
    pub async fn lookup(
        &self,
        identifier_type: IdentifierType,
        identifier: &str,
    ) -> Result<Option<Cast>, FeedApiError> {
        let endpoint = "GET /v2/farcaster/cast";
        let query = [("identifier", identifier), ("type", identifier_type.as_str())];

        let resp = send_idempotent(Backoff::default(), || {
            self.http.get(&self.cast_url).query(&query).send()
        })
        .await
        .map_err(|e| FeedApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedApiError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json::<CastLookupResponse>()
            .await
            .map(|r| Some(r.cast))
            .map_err(|e| FeedApiError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }

    /// Publish a cast as the configured signer.
    ///
    /// Calls `POST {base_url}/v2/farcaster/cast` once, without retry.
    pub async fn publish(
        &self,
        text: &str,
        parent: Option<&str>,
        channel_id: Option<&str>,
    ) -> Result<PublishedCast, FeedApiError> {
        let endpoint = "POST /v2/farcaster/cast";
        let body = PublishCastRequest {
            signer_uuid: self.signer_uuid.as_str(),
            text,
            parent,
            channel_id,
        };

        let resp = self
            .http
            .post(&self.cast_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FeedApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedApiError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let parsed: PublishCastResponse =
            resp.json().await.map_err(|e| FeedApiError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !parsed.success {
            tracing::warn!(hash = %parsed.cast.hash, "feed API reported success=false with a cast hash");
        }
        Ok(parsed.cast)
    }
}
