//! Gemini REST client.
//!
//! One provider serves both halves of the pipeline that talk to Google:
//! - `models/{embed_model}:embedContent` for query embeddings
//! - `models/{gen_model}:generateContent` for the final answer
//!
//! The API key travels as the `key` query parameter. Error messages are
//! stripped of the request URL so the key never reaches a log line.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use teidaishu_config::GeminiConfig;
use teidaishu_core::embedding::{Embedder, EmbeddingVector, TaskType};
use teidaishu_core::error::{EmbeddingError, GenerationError};
use teidaishu_core::generation::{GenerationRequest, Generator};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini embedding and generation endpoints.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embed_model: String,
    gen_model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider with default models.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            embed_model: "gemini-embedding-001".into(),
            gen_model: "gemini-2.5-flash".into(),
            client,
        })
    }

    /// Build from the `[gemini]` config section.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EmbeddingError::NotConfigured("gemini.api_key is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            embed_model: config.embed_model.clone(),
            gen_model: config.gen_model.clone(),
            client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, embed_model: impl Into<String>, gen_model: impl Into<String>) -> Self {
        self.embed_model = embed_model.into();
        self.gen_model = gen_model.into();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn embed_body(text: &str, task_type: &TaskType, dimensions: u32) -> ApiEmbedRequest {
        ApiEmbedRequest {
            content: ApiContent {
                role: None,
                parts: vec![ApiPart {
                    text: Some(text.to_string()),
                }],
            },
            task_type: task_type.as_str().to_string(),
            output_dimensionality: dimensions,
        }
    }

    fn generate_body(request: &GenerationRequest) -> ApiGenerateRequest {
        ApiGenerateRequest {
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    /// Concatenate the text parts of the first candidate. Missing pieces read
    /// as an empty answer.
    fn extract_answer(response: ApiGenerateResponse) -> String {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[async_trait]
impl Embedder for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(
        &self,
        text: &str,
        task_type: &TaskType,
        dimensions: u32,
    ) -> std::result::Result<EmbeddingVector, EmbeddingError> {
        let url = self.endpoint(&self.embed_model, "embedContent");
        let body = Self::embed_body(text, task_type, dimensions);

        debug!(model = %self.embed_model, %task_type, dimensions, "Sending embed request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Embedding service returned error");
            return Err(EmbeddingError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let parsed: ApiEmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.without_url().to_string()))?;

        parsed
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| EmbeddingError::MalformedResponse("missing embedding.values".into()))
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let url = self.endpoint(&self.gen_model, "generateContent");
        let body = Self::generate_body(request);

        debug!(
            model = %self.gen_model,
            prompt_chars = request.prompt.chars().count(),
            temperature = request.temperature,
            max_output_tokens = request.max_output_tokens,
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Generation service returned error");
            return Err(GenerationError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let parsed: ApiGenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.without_url().to_string()))?;

        Ok(Self::extract_answer(parsed))
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEmbedRequest {
    content: ApiContent,
    task_type: String,
    output_dimensionality: u32,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedResponse {
    embedding: Option<ApiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiGenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: Option<ApiContent>,
}
