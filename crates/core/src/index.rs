//! VectorIndex trait: nearest-neighbour search over pre-embedded passages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::matches::Match;

/// How much metadata the index should return with each match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMetadata {
    None,
    Indexed,
    #[default]
    All,
}

/// Options for a single similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub top_k: u32,

    #[serde(default)]
    pub return_metadata: ReturnMetadata,

    #[serde(default)]
    pub return_values: bool,

    /// Opaque metadata filter forwarded to the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
}

impl QueryOptions {
    /// Full metadata, no vector values. The pipeline always asks for this.
    pub fn top_k(top_k: u32) -> Self {
        Self {
            top_k,
            return_metadata: ReturnMetadata::All,
            return_values: false,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<serde_json::Value>) -> Self {
        self.filter = filter;
        self
    }
}

/// The similarity index.
///
/// Returns matches ranked best-first, verbatim; an index that reports no
/// matches yields an empty list.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index name, echoed back in query results.
    fn name(&self) -> &str;

    async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> std::result::Result<Vec<Match>, IndexError>;
}
