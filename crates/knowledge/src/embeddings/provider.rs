//! Embedding provider trait and factory.

use crate::chunk;
use crate::similarity;
use docsift_core::config::ProviderConfig;
use docsift_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token accounting reported (or estimated) for one provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingUsage {
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

impl EmbeddingUsage {
    /// Usage estimated at four chars per token, for providers that report none.
    pub fn estimate(texts: &[String]) -> Self {
        let tokens = texts
            .iter()
            .map(|t| t.chars().count().div_ceil(chunk::DEFAULT_CHARS_PER_TOKEN) as u64)
            .sum();
        Self {
            prompt_tokens: tokens,
            total_tokens: tokens,
        }
    }

    pub fn add(&mut self, other: EmbeddingUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Vectors for one batch of texts, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingBatch {
    pub embeddings: Vec<Vec<f32>>,
    pub usage: EmbeddingUsage,
}

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<EmbeddingBatch>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch.embeddings.pop().ok_or_else(|| {
            AppError::ProviderFailure(format!("{} returned no embedding", self.provider_name()))
        })
    }

    /// Cosine similarity between two vectors.
    fn calculate_similarity(&self, a: &[f32], b: &[f32]) -> AppResult<f32> {
        similarity::cosine_similarity(a, b)
    }

    /// Split text into chunks sized for this provider.
    fn chunk_text(
        &self,
        text: &str,
        max_tokens: usize,
        file_type: Option<&str>,
    ) -> AppResult<Vec<String>> {
        chunk::chunk_text(text, max_tokens, file_type)
    }
}

/// Create an embedding provider from its configuration.
///
/// Hosted providers need an API key; the factory does not contact the
/// provider.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    use super::providers::{
        gemini::GeminiProvider, mock::MockProvider, ollama::OllamaProvider, openai::OpenAIProvider,
    };

    let require_key = |env_var: &str| {
        api_key.map(str::to_string).ok_or_else(|| {
            AppError::Config(format!(
                "API key for provider '{}' not found (set {} or DOCSIFT_API_KEY)",
                name, env_var
            ))
        })
    };

    let provider: Arc<dyn EmbeddingProvider> = match config {
        ProviderConfig::OpenAI {
            api_key_env,
            model,
            endpoint,
            dimensions,
        } => Arc::new(OpenAIProvider::new(
            require_key(api_key_env)?,
            model,
            endpoint.as_deref(),
            *dimensions,
        )?),

        ProviderConfig::Gemini {
            api_key_env,
            model,
            endpoint,
            dimensions,
        } => Arc::new(GeminiProvider::new(
            require_key(api_key_env)?,
            model,
            endpoint.as_deref(),
            *dimensions,
        )?),

        ProviderConfig::Ollama {
            endpoint,
            model,
            dimensions,
            timeout,
        } => Arc::new(OllamaProvider::new(endpoint, model, *dimensions, *timeout)?),

        ProviderConfig::Mock { dimensions } => Arc::new(MockProvider::new(
            dimensions.unwrap_or(super::providers::mock::DEFAULT_DIMENSIONS),
        )),
    };

    tracing::debug!(
        "Created embedding provider '{}': type={}, model={}, dimensions={}",
        name,
        provider.provider_name(),
        provider.model_name(),
        provider.dimensions()
    );

    Ok(provider)
}
