//! Cloudflare Vectorize v2 REST client.
//!
//! Queries go to
//! `{api_url}/accounts/{account_id}/vectorize/v2/indexes/{index}/query`
//! with a bearer token. The response envelope is
//! `{success, errors, result: {count, matches}}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use teidaishu_config::IndexConfig;
use teidaishu_core::error::IndexError;
use teidaishu_core::index::{QueryOptions, VectorIndex};
use teidaishu_core::matches::Match;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// A remote Vectorize index.
pub struct VectorizeIndex {
    api_url: String,
    account_id: String,
    index_name: String,
    api_token: String,
    client: reqwest::Client,
}

impl VectorizeIndex {
    pub fn new(
        account_id: impl Into<String>,
        index_name: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_url: DEFAULT_API_URL.to_string(),
            account_id: account_id.into(),
            index_name: index_name.into(),
            api_token: api_token.into(),
            client,
        })
    }

    /// Build from the `[index]` config section.
    pub fn from_config(config: &IndexConfig) -> Result<Self, IndexError> {
        let missing = |field: &str| IndexError::NotConfigured(format!("index.{field} is not set"));
        let account_id = config.account_id.clone().ok_or_else(|| missing("account_id"))?;
        let index_name = config.index_name.clone().ok_or_else(|| missing("index_name"))?;
        let api_token = config.api_token.clone().ok_or_else(|| missing("api_token"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexError::NotConfigured(e.to_string()))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            account_id,
            index_name,
            api_token,
            client,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self) -> String {
        format!(
            "{}/accounts/{}/vectorize/v2/indexes/{}/query",
            self.api_url, self.account_id, self.index_name
        )
    }

    fn query_body(vector: &[f32], options: &QueryOptions) -> serde_json::Value {
        let mut body = serde_json::to_value(options).unwrap_or_else(|_| serde_json::json!({}));
        body["vector"] = serde_json::json!(vector);
        body
    }

    fn unwrap_envelope(envelope: ApiEnvelope) -> Result<Vec<Match>, IndexError> {
        if !envelope.success {
            let reason = envelope
                .errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{code}: {}", e.message),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(IndexError::Rejected(if reason.is_empty() {
                "success=false".into()
            } else {
                reason
            }));
        }

        Ok(envelope.result.map(|r| r.matches).unwrap_or_default())
    }
}

#[async_trait]
impl VectorIndex for VectorizeIndex {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> std::result::Result<Vec<Match>, IndexError> {
        let body = Self::query_body(vector, options);

        debug!(
            index = %self.index_name,
            top_k = options.top_k,
            filtered = options.filter.is_some(),
            "Querying Vectorize"
        );

        let response = self
            .client
            .post(self.query_url())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Vectorize returned error");
            return Err(IndexError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| IndexError::MalformedResponse(e.to_string()))?;

        let matches = Self::unwrap_envelope(envelope)?;
        debug!(count = matches.len(), "Vectorize query complete");
        Ok(matches)
    }
}

// --- Vectorize API types ---

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<ApiQueryResult>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiQueryResult {
    #[serde(default)]
    matches: Vec<Match>,
}
