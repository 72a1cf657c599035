//! In-memory backends, useful for testing and for small local corpora.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use teidaishu_core::content::ContentStore;
use teidaishu_core::error::{IndexError, StoreError};
use teidaishu_core::index::{QueryOptions, VectorIndex};
use teidaishu_core::matches::Match;
use tokio::sync::RwLock;

use crate::vector::{IndexedPassage, rank};

/// A content store that keeps passage text in a map.
pub struct InMemoryContentStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed the store with `(key, text)` pairs.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let blobs = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            blobs: Arc::new(RwLock::new(blobs)),
        }
    }

    pub async fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        self.blobs.write().await.insert(key.into(), text.into());
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.read().await.get(key).cloned())
    }
}

/// A brute-force cosine index over passages held in memory.
pub struct InMemoryIndex {
    name: String,
    passages: Arc<RwLock<Vec<IndexedPassage>>>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_passages(name, Vec::new())
    }

    pub fn with_passages(name: impl Into<String>, passages: Vec<IndexedPassage>) -> Self {
        Self {
            name: name.into(),
            passages: Arc::new(RwLock::new(passages)),
        }
    }

    /// Insert a passage, replacing any existing one with the same id.
    pub async fn upsert(&self, passage: IndexedPassage) {
        let mut passages = self.passages.write().await;
        passages.retain(|p| p.id != passage.id);
        passages.push(passage);
    }

    pub async fn len(&self) -> usize {
        self.passages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.passages.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, vector: &[f32], options: &QueryOptions) -> Result<Vec<Match>, IndexError> {
        let passages = self.passages.read().await;
        if let Some(first) = passages.first() {
            if first.values.len() != vector.len() {
                return Err(IndexError::Rejected(format!(
                    "query has {} dimensions, index has {}",
                    vector.len(),
                    first.values.len()
                )));
            }
        }
        Ok(rank(&passages, vector, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teidaishu_core::matches::Metadata;

    fn passage(id: &str, values: &[f32]) -> IndexedPassage {
        IndexedPassage {
            id: id.into(),
            values: values.to_vec(),
            metadata: Metadata::new().with("h", id),
        }
    }

    #[tokio::test]
    async fn content_store_hit_and_miss() {
        let store = InMemoryContentStore::with_entries([("staged/r/s/a/b/h.txt", "hello")]);
        assert_eq!(
            store.get("staged/r/s/a/b/h.txt").await.unwrap().as_deref(),
            Some("hello")
        );
        assert!(store.get("staged/r/s/a/b/other.txt").await.unwrap().is_none());

        store.insert("k", "v").await;
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn index_query_ranks_and_limits() {
        let index = InMemoryIndex::with_passages(
            "local",
            vec![passage("far", &[0.0, 1.0]), passage("near", &[1.0, 0.1])],
        );
        let matches = index.query(&[1.0, 0.0], &QueryOptions::top_k(1)).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "near");
        assert_eq!(matches[0].metadata.content_hash(), "near");
    }

    #[tokio::test]
    async fn index_upsert_replaces_by_id() {
        let index = InMemoryIndex::new("local");
        index.upsert(passage("a", &[1.0])).await;
        index.upsert(passage("a", &[0.5])).await;
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn index_rejects_dimension_mismatch() {
        let index = InMemoryIndex::with_passages("local", vec![passage("a", &[1.0, 0.0])]);
        let err = index.query(&[1.0], &QueryOptions::top_k(5)).await.unwrap_err();
        assert!(matches!(err, IndexError::Rejected(_)));
    }

    #[tokio::test]
    async fn empty_index_returns_no_matches() {
        let index = InMemoryIndex::new("local");
        assert!(index.query(&[1.0], &QueryOptions::top_k(5)).await.unwrap().is_empty());
    }
}
