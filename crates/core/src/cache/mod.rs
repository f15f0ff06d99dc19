//! # Cache Store
//!
//! A content-addressed key-value store over the local filesystem. Keys
//! derive from content hashes; values are JSON artifacts with a metadata
//! sidecar embedded and stripped on read. Used by every stage for
//! exact-once reuse of expensive external results across runs.

use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The three cache namespaces. Each maps to its own subdirectory so
/// listings stay bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Digitization,
    PageArtifact,
    ChapterArtifact,
}

impl Namespace {
    fn dirname(&self) -> &'static str {
        match self {
            Namespace::Digitization => "digitization",
            Namespace::PageArtifact => "page_artifact",
            Namespace::ChapterArtifact => "chapter_artifact",
        }
    }
}

/// Sidecar recorded alongside every cached artifact, embedded in the
/// on-disk envelope and stripped before the artifact is handed back to a
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub original_path: Option<String>,
    pub size: Option<u64>,
    pub mtime: Option<DateTime<Utc>>,
    pub cached_at: DateTime<Utc>,
    pub source_category: Option<String>,
}

impl CacheMeta {
    pub fn now() -> Self {
        CacheMeta {
            original_path: None,
            size: None,
            mtime: None,
            cached_at: Utc::now(),
            source_category: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    cache_meta: CacheMeta,
    /// `None` is treated identically to a missing file: absent.
    artifact: Option<serde_json::Value>,
}

/// Content-addressed filesystem cache. Safe under concurrent read and
/// concurrent write: publishes are rename-atomic and readers tolerate torn
/// or malformed files as misses.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore { root: root.into() }
    }

    fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.dirname())
    }

    fn entry_path(&self, namespace: Namespace, key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(format!("{key}.json"))
    }

    /// Looks up `key` within `namespace`. Any failure mode — missing file,
    /// malformed JSON, an envelope with no embedded artifact — is treated
    /// as a plain cache miss, never an error.
    pub fn lookup<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        let path = self.entry_path(namespace, key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };
        let envelope: Envelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };
        let artifact = envelope.artifact?;
        match serde_json::from_value(artifact) {
            Ok(value) => {
                debug!(namespace = ?namespace, key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache entry did not match expected shape, treating as miss");
                None
            }
        }
    }

    /// Atomically publishes `artifact` under `key` within `namespace`: a
    /// temporary sibling file is written first, then renamed over the
    /// target so a torn write is never observable. Failure is logged and
    /// swallowed — the pipeline must complete even with a read-only cache
    /// directory.
    pub fn store<T: Serialize>(&self, namespace: Namespace, key: &str, artifact: &T, meta: CacheMeta) {
        if let Err(e) = self.try_store(namespace, key, artifact, meta) {
            warn!(namespace = ?namespace, key, error = %e, "failed to publish cache entry, continuing without it");
        }
    }

    fn try_store<T: Serialize>(
        &self,
        namespace: Namespace,
        key: &str,
        artifact: &T,
        meta: CacheMeta,
    ) -> Result<(), CacheError> {
        let dir = self.namespace_dir(namespace);
        std::fs::create_dir_all(&dir)?;

        let artifact_value = serde_json::to_value(artifact)
            .map_err(|e| CacheError::Publish(format!("failed to serialize artifact: {e}")))?;
        let envelope = Envelope {
            cache_meta: meta,
            artifact: Some(artifact_value),
        };
        let payload = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| CacheError::Publish(format!("failed to serialize envelope: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut tmp, &payload)?;
        tmp.persist(self.entry_path(namespace, key))
            .map_err(|e| CacheError::Publish(e.to_string()))?;
        debug!(namespace = ?namespace, key, "cache entry published");
        Ok(())
    }

    /// Streaming MD5 over a file's bytes, read in 4 KiB chunks. Used to
    /// derive keys for raw PDFs.
    pub fn file_fingerprint(&self, path: &Path) -> Result<String, CacheError> {
        let mut file = std::fs::File::open(path)?;
        let mut context = md5::Context::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            context.consume(&buf[..n]);
        }
        Ok(format!("{:x}", context.compute()))
    }

    /// MD5 over UTF-8-encoded text. Used for page and chapter artifact
    /// content hashes.
    pub fn content_fingerprint(text: &str) -> String {
        format!("{:x}", md5::compute(text.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        name: String,
        count: u32,
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let widget = Widget {
            name: "gizmo".into(),
            count: 3,
        };
        store.store(Namespace::PageArtifact, "abc123", &widget, CacheMeta::now());
        let found: Option<Widget> = store.lookup(Namespace::PageArtifact, "abc123");
        assert_eq!(found, Some(widget));
    }

    #[test]
    fn missing_key_is_a_plain_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let found: Option<Widget> = store.lookup(Namespace::PageArtifact, "does-not-exist");
        assert_eq!(found, None);
    }

    #[test]
    fn corrupt_json_is_treated_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("page_artifact")).unwrap();
        std::fs::write(dir.path().join("page_artifact/bad.json"), b"{not json").unwrap();
        let found: Option<Widget> = store.lookup(Namespace::PageArtifact, "bad");
        assert_eq!(found, None);
    }

    #[test]
    fn store_failure_is_swallowed_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("deeply/nested/but/creatable"));
        let widget = Widget {
            name: "gizmo".into(),
            count: 1,
        };
        // create_dir_all means this actually succeeds; the point under test
        // is only that `store` never panics or returns a Result to unwrap.
        store.store(Namespace::Digitization, "k", &widget, CacheMeta::now());
    }

    #[test]
    fn content_fingerprint_is_deterministic() {
        let a = CacheStore::content_fingerprint("hello world");
        let b = CacheStore::content_fingerprint("hello world");
        assert_eq!(a, b);
        assert_ne!(a, CacheStore::content_fingerprint("hello world!"));
    }

    #[test]
    fn file_fingerprint_matches_content_fingerprint_for_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"hello world").unwrap();
        let file_hash = store.file_fingerprint(&path).unwrap();
        let content_hash = CacheStore::content_fingerprint("hello world");
        assert_eq!(file_hash, content_hash);
    }
}
