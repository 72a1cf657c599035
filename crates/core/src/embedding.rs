//! Embedder trait: turns text into a fixed-dimension vector.
//!
//! Query-time and document-time embeddings are produced by the same model but
//! tagged with a different task type so the service can specialise them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// An embedding vector. Produced once per query, consumed once by the index.
pub type EmbeddingVector = Vec<f32>;

/// Smallest accepted output dimensionality.
pub const MIN_DIMENSIONS: u32 = 1;
/// Largest accepted output dimensionality.
pub const MAX_DIMENSIONS: u32 = 3072;

/// Which side of retrieval an embedding is for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    /// Embedding of a user question.
    #[default]
    Query,
    /// Embedding of a stored passage.
    Document,
    /// Any other service-specific tag, passed through verbatim.
    Custom(String),
}

impl TaskType {
    /// The wire name of this task type.
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Query => "RETRIEVAL_QUERY",
            TaskType::Document => "RETRIEVAL_DOCUMENT",
            TaskType::Custom(s) => s,
        }
    }

    /// Parse a wire name, mapping the two well-known tags to their variants.
    pub fn from_name(name: &str) -> Self {
        match name {
            "RETRIEVAL_QUERY" => TaskType::Query,
            "RETRIEVAL_DOCUMENT" => TaskType::Document,
            other => TaskType::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The embedding service.
///
/// Fails with [`EmbeddingError`] on a non-success status or a response that
/// lacks the vector field. Implementations must not retry.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name (e.g. "gemini").
    fn name(&self) -> &str;

    async fn embed(
        &self,
        text: &str,
        task_type: &TaskType,
        dimensions: u32,
    ) -> std::result::Result<EmbeddingVector, EmbeddingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_wire_names() {
        assert_eq!(TaskType::Query.as_str(), "RETRIEVAL_QUERY");
        assert_eq!(TaskType::Document.to_string(), "RETRIEVAL_DOCUMENT");
        assert_eq!(TaskType::from_name("RETRIEVAL_QUERY"), TaskType::Query);
        assert_eq!(
            TaskType::from_name("SEMANTIC_SIMILARITY"),
            TaskType::Custom("SEMANTIC_SIMILARITY".into())
        );
    }
}
