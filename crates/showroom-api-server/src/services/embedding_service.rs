use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EmbeddingConfig, OpenAiConfig};
use crate::utils::error::ProviderError;

/// Narrow seam to whatever turns text into a fixed-length vector.
/// Production uses the hosted embeddings API; tests substitute a
/// deterministic mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings over the OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbeddingService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout_seconds: u64,
}

impl OpenAiEmbeddingService {
    pub fn new(openai: &OpenAiConfig, config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .expect("failed to create HTTP client"),
            base_url: openai.base_url.clone(),
            api_key: openai.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout_seconds: config.timeout_seconds,
        }
    }

    async fn embed_internal(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!(chars = text.len(), "requesting embedding");

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Malformed("empty data array".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(ProviderError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_internal(text).await
    }
}
