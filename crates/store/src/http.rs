//! HTTP object-store content backend.
//!
//! `GET {base_url}/{key}` against an R2/S3 public bucket, a signed proxy, or
//! any static file server. A 404 is a miss; every other non-success status is
//! an error.

use async_trait::async_trait;
use std::time::Duration;
use teidaishu_core::content::ContentStore;
use teidaishu_core::error::StoreError;
use tracing::{trace, warn};

pub struct HttpContentStore {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl HttpContentStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            client,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut request = self.client.get(self.object_url(key));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            trace!(key, "Content miss");
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), key, "Object store returned error");
            return Err(StoreError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let text = response.text().await.map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(text))
    }
}
