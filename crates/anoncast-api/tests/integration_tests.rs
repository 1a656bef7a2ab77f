//! # Integration Tests for anoncast-api
//!
//! Drives the full router with `oneshot`: submission status mapping,
//! message lookup, eligibility, roots, auth, health probes, metrics and
//! the OpenAPI document. The feed is replaced by in-process collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anoncast_api::state::{AppConfig, AppState};
use anoncast_core::{
    encode_public_inputs, CastHash, DecodedInputs, EligibleCredentialSet, ExternalHash,
    FieldElement, Submission,
};
use anoncast_pipeline::{
    FixedClock, GatewayError, IdentifierType, InMemoryMessageStore, LookupError, MessagePipeline,
    PipelineConfig, PostRef, PublicationGateway, PublishRequest, ReplyLookup, RootRegistry,
    RootSnapshot, StaticRootSource, SubmissionValidator,
};
use anoncast_zkp::{CircuitArtifact, MockProofSystem, ProofVerifier, SubmissionVerifier};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use zeroize::Zeroizing;

const NOW: i64 = 1_714_564_800;

struct CountingGateway {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl PublicationGateway for CountingGateway {
    async fn publish(&self, _request: &PublishRequest) -> Result<ExternalHash, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GatewayError::Ambiguous("upstream timed out at 10.1.2.3".into()));
        }
        Ok(ExternalHash::new(format!("0xc0ffee{n:034x}")).unwrap())
    }
}

struct NoReplies;

#[async_trait]
impl ReplyLookup for NoReplies {
    async fn get_post(
        &self,
        _identifier_type: IdentifierType,
        _identifier: &str,
    ) -> Result<Option<PostRef>, LookupError> {
        Ok(None)
    }
}

struct TestApp {
    state: AppState,
    gateway: Arc<CountingGateway>,
    verifier: Arc<ProofVerifier<MockProofSystem>>,
}

impl TestApp {
    async fn new(auth_token: Option<&str>, gateway_fails: bool) -> Self {
        let source = StaticRootSource::new(RootSnapshot {
            current: FieldElement::from_u64(2),
            legacy: vec![FieldElement::from_u64(1)],
        });
        let registry = Arc::new(RootRegistry::load(Arc::new(source)).await.unwrap());
        let validator =
            SubmissionValidator::new(registry, Arc::new(NoReplies), PipelineConfig::default());
        let verifier = Arc::new(ProofVerifier::new(
            MockProofSystem,
            CircuitArtifact::development(),
        ));
        verifier.prepare().await.unwrap();
        let gateway = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
            fail: gateway_fails,
        });

        let pipeline = MessagePipeline::new(
            validator,
            verifier.clone(),
            gateway.clone(),
            Arc::new(InMemoryMessageStore::new()),
        )
        .with_clock(Arc::new(FixedClock::new(NOW)));

        let config = AppConfig {
            port: 8080,
            auth_token: auth_token.map(|t| Zeroizing::new(t.to_string())),
        };
        let state = AppState::new(
            config,
            Arc::new(pipeline),
            EligibleCredentialSet::new([3, 1, 2]),
        )
        .unwrap();

        Self {
            state,
            gateway,
            verifier,
        }
    }

    fn router(&self) -> axum::Router {
        anoncast_api::app(self.state.clone())
    }

    fn gateway_calls(&self) -> usize {
        self.gateway.calls.load(Ordering::SeqCst)
    }

    fn body(&self, root: u64, age: i64, reply_to: Option<CastHash>) -> serde_json::Value {
        let decoded = DecodedInputs {
            text: "gm from nobody in particular".into(),
            timestamp_unix: NOW - age,
            root: FieldElement::from_u64(root),
            reply_to,
            channel: None,
        };
        let inputs = encode_public_inputs(&decoded);
        let unsigned = Submission::new(Vec::new(), inputs.clone());
        let vk = self.verifier.verifying_key().unwrap();
        let proof = MockProofSystem.prove(vk, &unsigned.public_input_bytes());
        let submission = Submission::new(proof, inputs);
        serde_json::to_value(&submission).unwrap()
    }
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn liveness_probe() {
    let app = TestApp::new(None, false).await;
    let response = app.router().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn readiness_probe_when_prepared() {
    let app = TestApp::new(None, false).await;
    let response = app.router().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Submission ---------------------------------------------------------------

#[tokio::test]
async fn valid_submission_is_published() {
    let app = TestApp::new(None, false).await;
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(1, 5, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["timestamp"], "2024-05-01T11:59:55.000Z");
    assert!(body["replyTo"].is_null());
    assert!(body["externalHash"].as_str().unwrap().starts_with("0xc0ffee"));
    assert_eq!(app.gateway_calls(), 1);
}

#[tokio::test]
async fn unknown_root_is_422() {
    let app = TestApp::new(None, false).await;
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(77, 5, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_ROOT");
    assert_eq!(app.gateway_calls(), 0);
}

#[tokio::test]
async fn stale_proof_is_422() {
    let app = TestApp::new(None, false).await;
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(2, 601, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "STALE_PROOF");
}

#[tokio::test]
async fn unresolved_reply_is_422() {
    let app = TestApp::new(None, false).await;
    let body = app.body(2, 5, Some(CastHash::from_bytes([9; 20])));
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "REPLY_TARGET_UNRESOLVED"
    );
}

#[tokio::test]
async fn tampered_proof_is_422() {
    let app = TestApp::new(None, false).await;
    let mut body = app.body(2, 5, None);
    body["proof"] = serde_json::json!(format!("0x{}", "00".repeat(32)));
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "PROOF_INVALID");
    assert_eq!(app.gateway_calls(), 0);
}

#[tokio::test]
async fn replay_is_409() {
    let app = TestApp::new(None, false).await;
    let body = app.body(2, 5, None);

    let first = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"]["code"], "REPLAY_DETECTED");
    assert_eq!(app.gateway_calls(), 1);
}

#[tokio::test]
async fn too_few_inputs_is_400() {
    let app = TestApp::new(None, false).await;
    let body = serde_json::json!({ "proof": "0xabcd", "publicInputs": ["0x1", "0x2"] });
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "DECODE_ERROR");
}

#[tokio::test]
async fn non_canonical_field_element_is_400() {
    let app = TestApp::new(None, false).await;
    let body = serde_json::json!({
        "proof": "0xabcd",
        "publicInputs": [format!("0x{}", "f".repeat(64))]
    });
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "DECODE_ERROR");
    assert_eq!(body["error"]["details"]["stage"], "received");

    let metrics = app.router().oneshot(get("/metrics")).await.unwrap();
    let text = body_string(metrics).await;
    assert!(text.contains("anoncast_submissions_total{outcome=\"DECODE_ERROR\"} 1"));
    assert_eq!(app.gateway_calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::new(None, false).await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gateway_fault_is_503_without_detail() {
    let app = TestApp::new(None, true).await;
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(2, 5, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INFRASTRUCTURE_FAULT");
    assert!(!body["error"]["message"].as_str().unwrap().contains("10.1.2.3"));
    assert_eq!(app.gateway_calls(), 1);
}

// -- Message Lookup -----------------------------------------------------------

#[tokio::test]
async fn published_message_is_found_by_hash_prefix_and_id() {
    let app = TestApp::new(None, false).await;
    let created = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(2, 5, None)))
        .await
        .unwrap();
    let hash = body_json(created).await["externalHash"]
        .as_str()
        .unwrap()
        .to_string();

    let by_hash = app
        .router()
        .oneshot(get(&format!("/v1/messages/hash/{}", &hash[..10])))
        .await
        .unwrap();
    assert_eq!(by_hash.status(), StatusCode::OK);
    let record = body_json(by_hash).await;
    assert_eq!(record["externalHash"], hash);
    assert_eq!(record["text"], "gm from nobody in particular");
    assert_eq!(record["version"], 1);

    let id = record["id"].as_str().unwrap();
    let by_id = app
        .router()
        .oneshot(get(&format!("/v1/messages/{id}")))
        .await
        .unwrap();
    assert_eq!(by_id.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_message_is_404() {
    let app = TestApp::new(None, false).await;
    let response = app
        .router()
        .oneshot(get("/v1/messages/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router()
        .oneshot(get("/v1/messages/hash/0xdeadbeef"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Eligibility & Roots ------------------------------------------------------

#[tokio::test]
async fn eligibility_list_and_check() {
    let app = TestApp::new(None, false).await;
    let response = app.router().oneshot(get("/v1/eligibility")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["fids"], serde_json::json!([1, 2, 3]));
    assert_eq!(body["count"], 3);

    let response = app.router().oneshot(get("/v1/eligibility/2")).await.unwrap();
    assert_eq!(body_json(response).await["eligible"], true);
    let response = app.router().oneshot(get("/v1/eligibility/99")).await.unwrap();
    assert_eq!(body_json(response).await["eligible"], false);
}

#[tokio::test]
async fn roots_are_listed() {
    let app = TestApp::new(None, false).await;
    let response = app.router().oneshot(get("/v1/roots")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["current"], FieldElement::from_u64(2).to_string());
    assert_eq!(body["legacy"][0], FieldElement::from_u64(1).to_string());
}

// -- Auth ---------------------------------------------------------------------

#[tokio::test]
async fn submission_requires_token_when_configured() {
    let app = TestApp::new(Some("letmein"), false).await;
    let response = app
        .router()
        .oneshot(post_json("/v1/messages", &app.body(2, 5, None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.gateway_calls(), 0);
}

#[tokio::test]
async fn submission_with_token_succeeds() {
    let app = TestApp::new(Some("letmein"), false).await;
    let mut request = post_json("/v1/messages", &app.body(2, 5, None));
    request
        .headers_mut()
        .insert("authorization", "Bearer letmein".parse().unwrap());
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn reads_do_not_require_token() {
    let app = TestApp::new(Some("letmein"), false).await;
    let response = app.router().oneshot(get("/v1/roots")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Metrics & OpenAPI --------------------------------------------------------

#[tokio::test]
async fn metrics_count_submissions() {
    let app = TestApp::new(None, false).await;
    app.router()
        .oneshot(post_json("/v1/messages", &app.body(2, 601, None)))
        .await
        .unwrap();

    let response = app.router().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains("anoncast_submissions_total{outcome=\"STALE_PROOF\"} 1"));
    assert!(text.contains("anoncast_ready 1"));
    assert!(text.contains("anoncast_known_roots 2"));
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let app = TestApp::new(None, false).await;
    let response = app.router().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"].get("/v1/messages").is_some());
}
