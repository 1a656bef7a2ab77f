//! # Feed Adapters
//!
//! Connect the feed HTTP client to the pipeline's collaborator traits.
//!
//! Publication errors are split by what they say about the remote state:
//! a 4xx answer means the feed refused the cast, anything else (timeout,
//! transport failure, 5xx, unreadable body) leaves the outcome unknown.

use std::sync::Arc;

use anoncast_core::ExternalHash;
use anoncast_feed_client::{FeedApiError, FeedClient};
use anoncast_pipeline::{
    GatewayError, IdentifierType, LookupError, PostRef, PublicationGateway, PublishRequest,
    ReplyLookup,
};
use async_trait::async_trait;

/// Resolves reply targets through the feed lookup endpoint.
#[derive(Debug, Clone)]
pub struct FeedReplyLookup {
    client: Arc<FeedClient>,
}

impl FeedReplyLookup {
    pub fn new(client: Arc<FeedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplyLookup for FeedReplyLookup {
    async fn get_post(
        &self,
        identifier_type: IdentifierType,
        identifier: &str,
    ) -> Result<Option<PostRef>, LookupError> {
        let kind = match identifier_type {
            IdentifierType::Hash => anoncast_feed_client::IdentifierType::Hash,
            IdentifierType::Url => anoncast_feed_client::IdentifierType::Url,
        };
        let cast = self
            .client
            .casts()
            .lookup(kind, identifier)
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        Ok(cast.map(|c| PostRef {
            hash: c.hash,
            author_fid: c.author.map(|a| a.fid),
        }))
    }
}

/// Publishes casts through the managed signer.
#[derive(Debug, Clone)]
pub struct FeedPublicationGateway {
    client: Arc<FeedClient>,
}

impl FeedPublicationGateway {
    pub fn new(client: Arc<FeedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PublicationGateway for FeedPublicationGateway {
    async fn publish(&self, request: &PublishRequest) -> Result<ExternalHash, GatewayError> {
        let parent = request.parent.map(|p| p.to_string());
        let published = self
            .client
            .casts()
            .publish(
                &request.text,
                parent.as_deref(),
                request.channel.as_ref().map(|c| c.as_str()),
            )
            .await
            .map_err(classify)?;

        // A success status without a hash still means a cast may exist.
        ExternalHash::new(published.hash)
            .map_err(|e| GatewayError::Ambiguous(format!("feed returned no cast hash: {e}")))
    }
}

fn classify(err: FeedApiError) -> GatewayError {
    match err.status() {
        Some(status) if err.is_rejection() => GatewayError::Rejected {
            status,
            reason: err.to_string(),
        },
        _ => GatewayError::Ambiguous(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anoncast_core::{CastHash, ChannelId};
    use anoncast_feed_client::FeedApiConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> Arc<FeedClient> {
        let config = FeedApiConfig::local_mock(&server.uri(), "test-key").unwrap();
        Arc::new(FeedClient::new(config).unwrap())
    }

    fn request() -> PublishRequest {
        PublishRequest {
            text: "hello".into(),
            parent: Some(CastHash::from_bytes([0xab; 20])),
            channel: Some(ChannelId::new("anon").unwrap()),
        }
    }

    #[tokio::test]
    async fn lookup_maps_cast_to_post_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/farcaster/cast"))
            .and(query_param("type", "hash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cast": { "hash": "0xfeed", "author": { "fid": 42 }, "text": "parent" }
            })))
            .mount(&server)
            .await;

        let lookup = FeedReplyLookup::new(client(&server).await);
        let post = lookup
            .get_post(IdentifierType::Hash, "0xfeed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.hash, "0xfeed");
        assert_eq!(post.author_fid, Some(42));
    }

    #[tokio::test]
    async fn lookup_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/farcaster/cast"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let lookup = FeedReplyLookup::new(client(&server).await);
        assert!(lookup
            .get_post(IdentifierType::Hash, "0xdead")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn publish_forwards_parent_and_channel() {
        let server = MockServer::start().await;
        let parent = CastHash::from_bytes([0xab; 20]).to_string();
        Mock::given(method("POST"))
            .and(path("/v2/farcaster/cast"))
            .and(body_json(serde_json::json!({
                "signer_uuid": "test-signer",
                "text": "hello",
                "parent": parent,
                "channel_id": "anon"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "cast": { "hash": "0xnew", "text": "hello" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = FeedPublicationGateway::new(client(&server).await);
        let hash = gateway.publish(&request()).await.unwrap();
        assert_eq!(hash.as_str(), "0xnew");
    }

    #[tokio::test]
    async fn publish_4xx_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/farcaster/cast"))
            .respond_with(ResponseTemplate::new(400).set_body_string("text too long"))
            .mount(&server)
            .await;

        let gateway = FeedPublicationGateway::new(client(&server).await);
        match gateway.publish(&request()).await.unwrap_err() {
            GatewayError::Rejected { status, .. } => assert_eq!(status, 400),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_5xx_is_ambiguous_and_sent_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/farcaster/cast"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = FeedPublicationGateway::new(client(&server).await);
        assert!(matches!(
            gateway.publish(&request()).await.unwrap_err(),
            GatewayError::Ambiguous(_)
        ));
    }
}
