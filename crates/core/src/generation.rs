//! Generator trait: the text-generation model behind `ask`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Smallest accepted output token cap.
pub const MIN_OUTPUT_TOKENS: u32 = 1;
/// Largest accepted output token cap.
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// A single-turn generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The fully composed prompt.
    pub prompt: String,

    pub temperature: f64,

    pub max_output_tokens: u32,
}

/// The generation service.
///
/// A response with no usable text is `Ok(String::new())`, not an error.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name (e.g. "gemini").
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError>;
}
