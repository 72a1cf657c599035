//! JSONL-backed local similarity index.
//!
//! Each line is one [`IndexedPassage`] (`{"id", "values", "metadata"}`), the
//! same record format used to bulk-load a Vectorize index. The whole file is
//! loaded on open and queried by brute-force cosine similarity.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teidaishu_core::error::IndexError;
use teidaishu_core::index::{QueryOptions, VectorIndex};
use teidaishu_core::matches::Match;
use tracing::{debug, warn};

use crate::in_memory::InMemoryIndex;
use crate::vector::IndexedPassage;

pub struct JsonlIndex {
    path: PathBuf,
    inner: InMemoryIndex,
}

impl JsonlIndex {
    /// Load every passage from `path`. Malformed lines are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            IndexError::NotConfigured(format!("cannot read {}: {e}", path.display()))
        })?;

        let passages = parse_passages(&content);
        debug!(path = %path.display(), count = passages.len(), "JSONL index loaded");

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jsonl".into());

        Ok(Self {
            inner: InMemoryIndex::with_passages(name, passages),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }
}

fn parse_passages(content: &str) -> Vec<IndexedPassage> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<IndexedPassage>(line) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(line = n + 1, error = %e, "Skipping malformed index line");
                None
            }
        })
        .collect()
}

#[async_trait]
impl VectorIndex for JsonlIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(&self, vector: &[f32], options: &QueryOptions) -> Result<Vec<Match>, IndexError> {
        self.inner.query(vector, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"id":"r:s:japan:a1","values":[1.0,0.0],"metadata":{"h":"aa","sid":"t3_1","sub":"japan","t":"s"}}
{"id":"r:c:japan:b2","values":[0.6,0.8],"metadata":{"h":"bb","sid":"t3_1","sub":"japan","t":"c"}}

not json at all
{"id":"r:s:rust:c3","values":[0.0,1.0],"metadata":{"h":"cc","sid":"t3_2","sub":"rust","t":"s"}}
"#;

    #[tokio::test]
    async fn loads_and_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reddit.jsonl");
        std::fs::write(&path, SAMPLE).unwrap();

        let index = JsonlIndex::open(&path).unwrap();
        assert_eq!(index.len().await, 3);
        assert_eq!(index.name(), "reddit");
    }

    #[tokio::test]
    async fn query_returns_ranked_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reddit.jsonl");
        std::fs::write(&path, SAMPLE).unwrap();

        let index = JsonlIndex::open(&path).unwrap();
        let matches = index.query(&[1.0, 0.0], &QueryOptions::top_k(2)).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "r:s:japan:a1");
        assert_eq!(matches[1].id, "r:c:japan:b2");
        assert!((matches[1].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_not_configured() {
        let err = JsonlIndex::open("/nonexistent/index.jsonl").err().unwrap();
        assert!(matches!(err, IndexError::NotConfigured(_)));
    }
}
