//! Similarity query client: embed the query, then ask the index.

use std::sync::Arc;
use teidaishu_core::embedding::{Embedder, TaskType};
use teidaishu_core::index::{QueryOptions, VectorIndex};
use teidaishu_core::matches::Match;
use tracing::debug;

/// Largest `top_k` the index accepts.
pub const MAX_TOP_K: u32 = 50;

pub struct SimilaritySearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    dimensions: u32,
    task_type: TaskType,
}

impl SimilaritySearch {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, dimensions: u32) -> Self {
        Self {
            embedder,
            index,
            dimensions,
            task_type: TaskType::Query,
        }
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    /// One embedding call, then one index query. No retries: the first
    /// failure is returned as is.
    pub async fn search(
        &self,
        query: &str,
        top_k: u32,
        filter: Option<serde_json::Value>,
    ) -> teidaishu_core::Result<Vec<Match>> {
        let vector = self
            .embedder
            .embed(query, &self.task_type, self.dimensions)
            .await?;

        debug!(
            embedder = self.embedder.name(),
            dimensions = vector.len(),
            "Query embedded"
        );

        let options = QueryOptions::top_k(top_k.clamp(1, MAX_TOP_K)).with_filter(filter);
        let matches = self.index.query(&vector, &options).await?;

        debug!(index = self.index.name(), matches = matches.len(), "Index queried");
        Ok(matches)
    }
}
