//! OpenAI embeddings provider.
//!
//! Calls `POST {endpoint}/embeddings` with bearer auth. Any endpoint
//! speaking the same API (Azure deployments, local gateways) works.

use super::http::{build_client, post_json};
use crate::embeddings::provider::{EmbeddingBatch, EmbeddingProvider, EmbeddingUsage};
use async_trait::async_trait;
use docsift_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI embedding provider.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
}

// Debug omits the API key.
impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u64,
    total_tokens: u64,
}

impl OpenAIProvider {
    /// Create a provider. `dimensions` defaults from the model name.
    ///
    /// # Models
    /// - `text-embedding-3-small` - 1536 dimensions
    /// - `text-embedding-3-large` - 3072 dimensions
    /// - `text-embedding-ada-002` - 1536 dimensions (legacy)
    pub fn new(
        api_key: String,
        model: &str,
        endpoint: Option<&str>,
        dimensions: Option<usize>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_client("openai", None)?,
            api_key,
            endpoint: endpoint
                .unwrap_or(DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions: dimensions.unwrap_or_else(|| default_dimensions(model)),
        })
    }
}

fn default_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Order response vectors by `index` and check the count.
fn into_batch(response: EmbeddingResponse, texts: &[String]) -> AppResult<EmbeddingBatch> {
    let mut data = response.data;
    if data.len() != texts.len() {
        return Err(AppError::ProviderFailure(format!(
            "openai: expected {} embeddings, got {}",
            texts.len(),
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);

    let usage = response
        .usage
        .map(|u| EmbeddingUsage {
            prompt_tokens: u.prompt_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_else(|| EmbeddingUsage::estimate(texts));

    Ok(EmbeddingBatch {
        embeddings: data.into_iter().map(|d| d.embedding).collect(),
        usage,
    })
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "openai", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch::default());
        }

        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbeddingResponse =
            post_json(&self.client, "openai", &url, Some(&self.api_key), &request).await?;
        let batch = into_batch(response, texts)?;

        debug!(
            "Generated {} embeddings ({} tokens)",
            batch.embeddings.len(),
            batch.usage.total_tokens
        );

        Ok(batch)
    }
}
