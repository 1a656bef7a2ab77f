//! # Root Registry
//!
//! The set of membership roots a proof may be anchored to: the current
//! root plus every root that was ever current. Clients can lag behind a
//! tree update, so a proof against an older root stays acceptable.
//!
//! The set is append-only. [`RootRegistry::refresh`] merges a newly loaded
//! [`RootSnapshot`]: new roots are added, a changed current root demotes
//! the previous one to legacy, nothing is ever removed. Until the first
//! successful load the registry is closed and every check is a fault.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anoncast_core::FieldElement;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Roots as published by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSnapshot {
    /// Root of the latest membership tree.
    pub current: FieldElement,
    /// Earlier roots that remain valid.
    #[serde(default)]
    pub legacy: Vec<FieldElement>,
}

/// Failure to load roots from a source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootSourceError {
    /// The source could not be read.
    #[error("root source unavailable: {0}")]
    Unavailable(String),
    /// The source was read but its content is invalid.
    #[error("root source malformed: {0}")]
    Malformed(String),
}

/// The registry has never been loaded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("root registry has not been loaded")]
pub struct RegistryNotLoaded;

/// Where roots come from.
#[async_trait]
pub trait RootSource: Send + Sync {
    /// Load the latest snapshot.
    async fn load(&self) -> Result<RootSnapshot, RootSourceError>;
}

/// Roots fixed at construction, typically from configuration.
#[derive(Debug, Clone)]
pub struct StaticRootSource {
    snapshot: RootSnapshot,
}

impl StaticRootSource {
    /// Serve `snapshot` on every load.
    pub fn new(snapshot: RootSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl RootSource for StaticRootSource {
    async fn load(&self) -> Result<RootSnapshot, RootSourceError> {
        Ok(self.snapshot.clone())
    }
}

/// Roots read from a JSON file of the form `{"current": "0x..", "legacy": [..]}`.
///
/// Re-read on every load, so operators can rotate roots by rewriting the
/// file and triggering a refresh.
#[derive(Debug, Clone)]
pub struct FileRootSource {
    path: PathBuf,
}

impl FileRootSource {
    /// Read roots from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a roots document.
    pub fn parse(raw: &str) -> Result<RootSnapshot, RootSourceError> {
        serde_json::from_str(raw).map_err(|e| RootSourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RootSource for FileRootSource {
    async fn load(&self) -> Result<RootSnapshot, RootSourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RootSourceError::Unavailable(format!("{}: {e}", self.path.display())))?;
        Self::parse(&raw)
    }
}

#[derive(Debug, Clone)]
struct RootSet {
    current: FieldElement,
    legacy: Vec<FieldElement>,
    members: HashSet<FieldElement>,
}

impl RootSet {
    fn from_snapshot(snapshot: RootSnapshot) -> Self {
        let mut set = Self {
            current: snapshot.current,
            legacy: Vec::new(),
            members: HashSet::from([snapshot.current]),
        };
        for root in snapshot.legacy {
            set.push_legacy(root);
        }
        set
    }

    fn push_legacy(&mut self, root: FieldElement) {
        if self.members.insert(root) {
            self.legacy.push(root);
        }
    }

    /// Append-only merge. Returns how many roots were added.
    fn merge(&mut self, snapshot: RootSnapshot) -> usize {
        let before = self.members.len();
        if snapshot.current != self.current {
            let previous = self.current;
            self.current = snapshot.current;
            // The new current may already be known as a legacy root.
            self.members.insert(snapshot.current);
            self.legacy.retain(|r| *r != snapshot.current);
            self.legacy.push(previous);
        }
        for root in snapshot.legacy {
            self.push_legacy(root);
        }
        self.members.len() - before
    }

    fn snapshot(&self) -> RootSnapshot {
        RootSnapshot {
            current: self.current,
            legacy: self.legacy.clone(),
        }
    }
}

/// Current and historical membership roots.
pub struct RootRegistry {
    source: Arc<dyn RootSource>,
    roots: RwLock<Option<RootSet>>,
}

impl std::fmt::Debug for RootRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRegistry")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl RootRegistry {
    /// Create an unloaded registry. Call [`refresh`](Self::refresh) before use.
    pub fn new(source: Arc<dyn RootSource>) -> Self {
        Self {
            source,
            roots: RwLock::new(None),
        }
    }

    /// Create and load a registry.
    pub async fn load(source: Arc<dyn RootSource>) -> Result<Self, RootSourceError> {
        let registry = Self::new(source);
        registry.refresh().await?;
        Ok(registry)
    }

    /// Pull from the source and merge.
    ///
    /// On failure the previous roots stay in place.
    pub async fn refresh(&self) -> Result<(), RootSourceError> {
        let snapshot = match self.source.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if self.is_loaded() {
                    tracing::warn!(error = %e, "root refresh failed, keeping last good roots");
                } else {
                    tracing::error!(error = %e, "initial root load failed, registry stays closed");
                }
                return Err(e);
            }
        };

        let mut guard = self.roots.write();
        match guard.as_mut() {
            Some(set) => {
                let previous = set.current;
                let added = set.merge(snapshot);
                if added > 0 || set.current != previous {
                    tracing::info!(
                        current = %set.current,
                        added,
                        total = set.members.len(),
                        "root registry updated"
                    );
                }
            }
            None => {
                let set = RootSet::from_snapshot(snapshot);
                tracing::info!(
                    current = %set.current,
                    total = set.members.len(),
                    "root registry loaded"
                );
                *guard = Some(set);
            }
        }
        Ok(())
    }

    /// Whether `root` is or was ever a current root.
    ///
    /// Returns `Err` if the registry has never loaded.
    pub fn check(&self, root: &FieldElement) -> Result<bool, RegistryNotLoaded> {
        self.roots
            .read()
            .as_ref()
            .map(|set| set.members.contains(root))
            .ok_or(RegistryNotLoaded)
    }

    /// Membership test; an unloaded registry accepts nothing.
    pub fn is_valid_root(&self, root: &FieldElement) -> bool {
        self.check(root).unwrap_or(false)
    }

    /// Whether at least one load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.roots.read().is_some()
    }

    /// Copy of the current roots.
    pub fn snapshot(&self) -> Option<RootSnapshot> {
        self.roots.read().as_ref().map(RootSet::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn root(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    /// Serves a scripted sequence of load results.
    struct ScriptedSource {
        script: Vec<Result<RootSnapshot, RootSourceError>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RootSource for ScriptedSource {
        async fn load(&self) -> Result<RootSnapshot, RootSourceError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.script[i.min(self.script.len() - 1)].clone()
        }
    }

    fn scripted(script: Vec<Result<RootSnapshot, RootSourceError>>) -> Arc<ScriptedSource> {
        Arc::new(ScriptedSource {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn snap(current: u64, legacy: &[u64]) -> RootSnapshot {
        RootSnapshot {
            current: root(current),
            legacy: legacy.iter().copied().map(root).collect(),
        }
    }

    #[tokio::test]
    async fn accepts_current_and_legacy() {
        let registry =
            RootRegistry::load(Arc::new(StaticRootSource::new(snap(3, &[1, 2])))).await.unwrap();
        assert!(registry.is_valid_root(&root(3)));
        assert!(registry.is_valid_root(&root(1)));
        assert!(!registry.is_valid_root(&root(4)));
    }

    #[tokio::test]
    async fn unloaded_registry_fails_closed() {
        let registry = RootRegistry::new(Arc::new(StaticRootSource::new(snap(1, &[]))));
        assert_eq!(registry.check(&root(1)), Err(RegistryNotLoaded));
        assert!(!registry.is_valid_root(&root(1)));
        assert!(registry.snapshot().is_none());
    }

    #[tokio::test]
    async fn rotation_demotes_previous_current() {
        let source = scripted(vec![Ok(snap(1, &[])), Ok(snap(2, &[]))]);
        let registry = RootRegistry::load(source).await.unwrap();
        registry.refresh().await.unwrap();

        let s = registry.snapshot().unwrap();
        assert_eq!(s.current, root(2));
        assert_eq!(s.legacy, vec![root(1)]);
        assert!(registry.is_valid_root(&root(1)));
    }

    #[tokio::test]
    async fn roots_are_never_removed() {
        let source = scripted(vec![Ok(snap(5, &[1, 2, 3])), Ok(snap(5, &[]))]);
        let registry = RootRegistry::load(source).await.unwrap();
        registry.refresh().await.unwrap();
        for n in [1, 2, 3, 5] {
            assert!(registry.is_valid_root(&root(n)));
        }
    }

    #[tokio::test]
    async fn promoting_a_legacy_root_does_not_duplicate_it() {
        let source = scripted(vec![Ok(snap(2, &[1])), Ok(snap(1, &[]))]);
        let registry = RootRegistry::load(source).await.unwrap();
        registry.refresh().await.unwrap();
        let s = registry.snapshot().unwrap();
        assert_eq!(s.current, root(1));
        assert_eq!(s.legacy, vec![root(2)]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_good_roots() {
        let source = scripted(vec![
            Ok(snap(7, &[6])),
            Err(RootSourceError::Unavailable("down".into())),
        ]);
        let registry = RootRegistry::load(source).await.unwrap();
        assert!(registry.refresh().await.is_err());
        assert!(registry.is_valid_root(&root(7)));
        assert!(registry.is_valid_root(&root(6)));
    }

    #[tokio::test]
    async fn failed_initial_load_stays_closed() {
        let source = scripted(vec![Err(RootSourceError::Unavailable("down".into()))]);
        assert!(RootRegistry::load(source).await.is_err());
    }

    #[tokio::test]
    async fn file_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        std::fs::write(&path, r#"{"current": "0x0a", "legacy": ["0x09", "0x08"]}"#).unwrap();

        let registry = RootRegistry::load(Arc::new(FileRootSource::new(&path))).await.unwrap();
        assert!(registry.is_valid_root(&root(10)));
        assert!(registry.is_valid_root(&root(8)));
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let err = FileRootSource::new("/nonexistent/roots.json").load().await.unwrap_err();
        assert!(matches!(err, RootSourceError::Unavailable(_)));
    }

    #[test]
    fn parse_rejects_non_canonical_root() {
        let raw = r#"{"current": "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001"}"#;
        assert!(matches!(
            FileRootSource::parse(raw),
            Err(RootSourceError::Malformed(_))
        ));
    }
}
