//! Embeddings from a local Ollama server.
//!
//! The `/api/embeddings` endpoint takes one prompt per call, so a batch fans
//! out into a few concurrent requests. Transient failures are retried by the
//! shared HTTP helper.
//!
//! # Example
//! ```no_run
//! use docsift_knowledge::embeddings::EmbeddingProvider;
//! use docsift_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn run() -> docsift_core::AppResult<()> {
//! let provider = OllamaProvider::new("http://localhost:11434", "nomic-embed-text", None, None)?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use super::http::{build_client, post_json};
use crate::embeddings::provider::{EmbeddingBatch, EmbeddingProvider, EmbeddingUsage};
use async_trait::async_trait;
use docsift_core::{AppError, AppResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Requests in flight at once for one batch
const MAX_CONCURRENT_REQUESTS: usize = 4;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Create new Ollama provider.
    ///
    /// Does not contact Ollama; an unreachable server or missing model
    /// surfaces as `ProviderFailure` on the first embedding call.
    pub fn new(
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout_secs: Option<u64>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_client("ollama", timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions: dimensions.unwrap_or_else(|| default_dimensions(model)),
        })
    }

    /// Embed single text, retried by the shared HTTP layer
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response: EmbeddingResponse =
            post_json(&self.client, "ollama", &url, None, &request).await?;

        if response.embedding.is_empty() {
            return Err(AppError::ProviderFailure(format!(
                "ollama: model '{}' returned an empty embedding. Run: ollama pull {}",
                self.model, self.model
            )));
        }

        Ok(response.embedding)
    }
}

fn default_dimensions(model: &str) -> usize {
    match model {
        "mxbai-embed-large" => 1024,
        "all-minilm" => 384,
        _ => 768,
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch::default());
        }

        debug!("Embedding batch of {} texts", texts.len());

        // Futures are lazy; `buffered` polls at most MAX_CONCURRENT_REQUESTS
        // of them and keeps results in input order.
        let requests: Vec<_> = texts.iter().map(|text| self.embed_single(text)).collect();
        let embeddings: Vec<Vec<f32>> = stream::iter(requests)
            .buffered(MAX_CONCURRENT_REQUESTS)
            .try_collect()
            .await?;

        Ok(EmbeddingBatch {
            embeddings,
            usage: EmbeddingUsage::estimate(texts),
        })
    }
}
