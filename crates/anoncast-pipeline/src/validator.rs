//! # Submission Validation
//!
//! The checks that run before a proof is verified, in the order the
//! pipeline applies them:
//!
//! 1. **Root**: the proof's membership root is in the [`RootRegistry`].
//! 2. **Freshness**: the proof timestamp is no older than the freshness
//!    window and no further ahead of the server clock than the allowed skew.
//! 3. **Reply legitimacy**: a reply target, if present, exists on the feed.
//!
//! Root and freshness are local and cheap. The reply check is a network
//! call and only runs for replies.

use std::sync::Arc;

use anoncast_core::{CastHash, DecodedInputs};
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{PipelineConfig, ReplyPolicy};
use crate::error::{CheckFailure, ErrorKind};
use crate::registry::RootRegistry;

/// How a post is identified in a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierType {
    /// Cast hash.
    Hash,
    /// Cast URL.
    Url,
}

/// A post that exists on the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    /// Feed-assigned hash.
    pub hash: String,
    /// Author account id, when known.
    pub author_fid: Option<u64>,
}

/// The lookup could not reach a verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("post lookup failed: {0}")]
pub struct LookupError(pub String);

/// Read-only access to posts on the feed.
#[async_trait]
pub trait ReplyLookup: Send + Sync {
    /// `Ok(None)` when the post does not exist.
    async fn get_post(
        &self,
        identifier_type: IdentifierType,
        identifier: &str,
    ) -> Result<Option<PostRef>, LookupError>;
}

/// Outcome of a reply-target lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyCheck {
    /// The target exists.
    Resolved(PostRef),
    /// The target was not found.
    Unresolved,
}

/// Root, freshness and reply checks.
pub struct SubmissionValidator {
    registry: Arc<RootRegistry>,
    lookup: Arc<dyn ReplyLookup>,
    config: PipelineConfig,
}

impl SubmissionValidator {
    /// Create a validator.
    pub fn new(
        registry: Arc<RootRegistry>,
        lookup: Arc<dyn ReplyLookup>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            lookup,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The root registry.
    pub fn registry(&self) -> &Arc<RootRegistry> {
        &self.registry
    }

    /// Reject roots the registry does not know.
    pub fn check_root(&self, decoded: &DecodedInputs) -> Result<(), CheckFailure> {
        match self.registry.check(&decoded.root) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CheckFailure::new(
                ErrorKind::InvalidRoot,
                format!("root {} is not a known membership root", decoded.root),
            )),
            Err(e) => Err(CheckFailure::new(
                ErrorKind::InfrastructureFault,
                e.to_string(),
            )),
        }
    }

    /// Reject proofs older than the freshness window or dated too far ahead.
    pub fn check_freshness(&self, decoded: &DecodedInputs, now: i64) -> Result<(), CheckFailure> {
        let ts = decoded.timestamp_unix;
        if ts.saturating_add(self.config.freshness_window_secs) < now {
            return Err(CheckFailure::new(
                ErrorKind::StaleProof,
                format!(
                    "proof is {}s old, window is {}s",
                    now.saturating_sub(ts),
                    self.config.freshness_window_secs
                ),
            ));
        }
        if ts > now.saturating_add(self.config.max_clock_skew_secs) {
            return Err(CheckFailure::new(
                ErrorKind::StaleProof,
                format!(
                    "proof is dated {}s in the future, allowed skew is {}s",
                    ts.saturating_sub(now),
                    self.config.max_clock_skew_secs
                ),
            ));
        }
        Ok(())
    }

    /// Resolve the reply target, if any, and apply the reply policy.
    ///
    /// Returns `None` for top-level posts.
    pub async fn check_reply(
        &self,
        decoded: &DecodedInputs,
    ) -> Result<Option<ReplyCheck>, CheckFailure> {
        let Some(parent) = decoded.reply_to else {
            return Ok(None);
        };
        let check = self.resolve(&parent).await?;
        if check == ReplyCheck::Unresolved {
            match self.config.reply_policy {
                ReplyPolicy::Reject => {
                    return Err(CheckFailure::new(
                        ErrorKind::ReplyTargetUnresolved,
                        format!("reply target {parent} was not found"),
                    ));
                }
                ReplyPolicy::LogAndProceed => {
                    tracing::warn!(
                        %parent,
                        policy = %self.config.reply_policy,
                        "reply target not found, publishing anyway"
                    );
                }
            }
        }
        Ok(Some(check))
    }

    async fn resolve(&self, parent: &CastHash) -> Result<ReplyCheck, CheckFailure> {
        let id = parent.to_string();
        match self.lookup.get_post(IdentifierType::Hash, &id).await {
            Ok(Some(post)) => {
                tracing::debug!(%parent, author_fid = ?post.author_fid, "reply target resolved");
                Ok(ReplyCheck::Resolved(post))
            }
            Ok(None) => Ok(ReplyCheck::Unresolved),
            Err(e) => Err(CheckFailure::new(
                ErrorKind::InfrastructureFault,
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RootSnapshot, StaticRootSource};
    use anoncast_core::FieldElement;

    struct NoPosts;

    #[async_trait]
    impl ReplyLookup for NoPosts {
        async fn get_post(
            &self,
            _t: IdentifierType,
            _id: &str,
        ) -> Result<Option<PostRef>, LookupError> {
            Ok(None)
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl ReplyLookup for BrokenLookup {
        async fn get_post(
            &self,
            _t: IdentifierType,
            _id: &str,
        ) -> Result<Option<PostRef>, LookupError> {
            Err(LookupError("connection reset".into()))
        }
    }

    async fn validator(lookup: Arc<dyn ReplyLookup>, policy: ReplyPolicy) -> SubmissionValidator {
        let source = StaticRootSource::new(RootSnapshot {
            current: FieldElement::from_u64(2),
            legacy: vec![FieldElement::from_u64(1)],
        });
        let registry = Arc::new(RootRegistry::load(Arc::new(source)).await.unwrap());
        SubmissionValidator::new(
            registry,
            lookup,
            PipelineConfig {
                reply_policy: policy,
                ..PipelineConfig::default()
            },
        )
    }

    fn decoded(root: u64, ts: i64) -> DecodedInputs {
        DecodedInputs {
            text: "x".into(),
            timestamp_unix: ts,
            root: FieldElement::from_u64(root),
            reply_to: None,
            channel: None,
        }
    }

    #[tokio::test]
    async fn unknown_root_is_invalid() {
        let v = validator(Arc::new(NoPosts), ReplyPolicy::Reject).await;
        assert!(v.check_root(&decoded(1, 0)).is_ok());
        let err = v.check_root(&decoded(9, 0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRoot);
    }

    #[tokio::test]
    async fn unloaded_registry_is_a_fault() {
        let registry = Arc::new(RootRegistry::new(Arc::new(StaticRootSource::new(
            RootSnapshot {
                current: FieldElement::from_u64(1),
                legacy: vec![],
            },
        ))));
        let v = SubmissionValidator::new(registry, Arc::new(NoPosts), PipelineConfig::default());
        let err = v.check_root(&decoded(1, 0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InfrastructureFault);
    }

    #[tokio::test]
    async fn freshness_window_boundaries() {
        let v = validator(Arc::new(NoPosts), ReplyPolicy::Reject).await;
        let now = 1_000_000;
        assert!(v.check_freshness(&decoded(1, now - 600), now).is_ok());
        assert_eq!(
            v.check_freshness(&decoded(1, now - 601), now).unwrap_err().kind,
            ErrorKind::StaleProof
        );
        assert!(v.check_freshness(&decoded(1, now + 60), now).is_ok());
        assert_eq!(
            v.check_freshness(&decoded(1, now + 61), now).unwrap_err().kind,
            ErrorKind::StaleProof
        );
    }

    #[tokio::test]
    async fn top_level_posts_skip_lookup() {
        let v = validator(Arc::new(BrokenLookup), ReplyPolicy::Reject).await;
        assert_eq!(v.check_reply(&decoded(1, 0)).await, Ok(None));
    }

    #[tokio::test]
    async fn unresolved_reply_follows_policy() {
        let mut d = decoded(1, 0);
        d.reply_to = Some(CastHash::from_bytes([7; 20]));

        let strict = validator(Arc::new(NoPosts), ReplyPolicy::Reject).await;
        assert_eq!(
            strict.check_reply(&d).await.unwrap_err().kind,
            ErrorKind::ReplyTargetUnresolved
        );

        let lenient = validator(Arc::new(NoPosts), ReplyPolicy::LogAndProceed).await;
        assert_eq!(
            lenient.check_reply(&d).await,
            Ok(Some(ReplyCheck::Unresolved))
        );
    }

    #[tokio::test]
    async fn lookup_failure_is_a_fault() {
        let mut d = decoded(1, 0);
        d.reply_to = Some(CastHash::from_bytes([7; 20]));
        let v = validator(Arc::new(BrokenLookup), ReplyPolicy::LogAndProceed).await;
        assert_eq!(
            v.check_reply(&d).await.unwrap_err().kind,
            ErrorKind::InfrastructureFault
        );
    }
}
