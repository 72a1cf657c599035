//! Shared scripted collaborators for pipeline tests.

use std::sync::Mutex;
use teidaishu_core::content::ContentStore;
use teidaishu_core::embedding::{Embedder, EmbeddingVector, TaskType};
use teidaishu_core::error::{EmbeddingError, GenerationError, IndexError, StoreError};
use teidaishu_core::generation::{GenerationRequest, Generator};
use teidaishu_core::index::{QueryOptions, VectorIndex};
use teidaishu_core::matches::{Match, Metadata};

/// A match with the two load-bearing metadata fields set.
pub fn match_for(id: &str, h: &str, sid: &str) -> Match {
    Match::new(id, 0.5, Metadata::new().with("h", h).with("sid", sid))
}

/// Returns the same vector on every call, or always fails.
pub struct ScriptedEmbedder {
    result: Result<EmbeddingVector, EmbeddingError>,
    calls: Mutex<Vec<(String, TaskType, u32)>>,
}

impl ScriptedEmbedder {
    pub fn new(vector: EmbeddingVector) -> Self {
        Self {
            result: Ok(vector),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: EmbeddingError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, TaskType, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Embedder for ScriptedEmbedder {
    fn name(&self) -> &str {
        "scripted_embedder"
    }

    async fn embed(
        &self,
        text: &str,
        task_type: &TaskType,
        dimensions: u32,
    ) -> Result<EmbeddingVector, EmbeddingError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), task_type.clone(), dimensions));
        self.result.clone()
    }
}

/// Returns the same ranked matches on every call, or always fails.
pub struct ScriptedIndex {
    result: Result<Vec<Match>, IndexError>,
    calls: Mutex<Vec<QueryOptions>>,
}

impl ScriptedIndex {
    pub fn new(matches: Vec<Match>) -> Self {
        Self {
            result: Ok(matches),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: IndexError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<QueryOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for ScriptedIndex {
    fn name(&self) -> &str {
        "scripted_index"
    }

    async fn query(&self, _vector: &[f32], options: &QueryOptions) -> Result<Vec<Match>, IndexError> {
        self.calls.lock().unwrap().push(options.clone());
        self.result.clone()
    }
}

/// Records every request and answers with a fixed string, or always fails.
pub struct RecordingGenerator {
    result: Result<String, GenerationError>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            result: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording_generator"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// A content store whose every read fails.
pub struct FailingStore;

#[async_trait::async_trait]
impl ContentStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Network("connection refused".into()))
    }
}
