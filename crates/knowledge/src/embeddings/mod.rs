//! Embedding engine.
//!
//! Provides provider-agnostic, batched embedding generation. Providers are
//! created on first use from the application config and cached by name.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingBatch, EmbeddingProvider, EmbeddingUsage};

use docsift_core::config::{AppConfig, MAX_BATCH_SIZE};
use docsift_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Vectors for a list of texts plus the provider that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOutcome {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
    pub usage: EmbeddingUsage,
    pub provider: String,
    pub model: String,
}

/// Central embedding engine that batches texts and caches providers.
pub struct EmbeddingEngine {
    config: AppConfig,
    providers: RwLock<HashMap<String, Arc<dyn EmbeddingProvider>>>,
}

impl EmbeddingEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a ready-made provider under `name`, replacing any cached one.
    pub fn with_provider(self, name: &str, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), provider);
        self
    }

    /// Name of the provider used when a caller names none.
    pub fn default_provider(&self) -> &str {
        &self.config.provider
    }

    /// Get or create the provider registered under `name`.
    pub fn provider(&self, name: Option<&str>) -> AppResult<Arc<dyn EmbeddingProvider>> {
        let name = name.unwrap_or(&self.config.provider);

        // Check cache first
        {
            let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(provider) = providers.get(name) {
                return Ok(Arc::clone(provider));
            }
        }

        let provider_config = self.config.provider_config(name)?;
        let api_key = self.config.resolve_api_key(name)?;
        let provider = create_provider(name, &provider_config, api_key.as_deref())?;

        // Keep whichever instance landed first
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        let cached = providers
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&provider));

        Ok(Arc::clone(cached))
    }

    /// Embed `texts` in batches of `batch_size` (default from config, at most 100).
    ///
    /// Waits `batchDelayMs` between consecutive batches. Every returned vector
    /// is checked against the provider's dimension.
    pub async fn embed_texts(
        &self,
        provider: Option<&str>,
        texts: &[String],
        batch_size: Option<usize>,
    ) -> AppResult<EmbedOutcome> {
        if texts.is_empty() {
            return Err(AppError::InvalidInput(
                "texts must be a non-empty array".to_string(),
            ));
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::InvalidInput(format!("texts[{}] is empty", i)));
        }

        let provider = self.provider(provider)?;
        let batch_size = batch_size
            .unwrap_or(self.config.embedding.batch_size)
            .clamp(1, MAX_BATCH_SIZE);
        let delay = Duration::from_millis(self.config.embedding.batch_delay_ms);
        let dimensions = provider.dimensions();

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {}, batch size: {})",
            texts.len(),
            provider.provider_name(),
            provider.model_name(),
            batch_size
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        let mut usage = EmbeddingUsage::default();

        for (i, batch) in texts.chunks(batch_size).enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = provider.embed_batch(batch).await?;
            if result.embeddings.len() != batch.len() {
                return Err(AppError::ProviderFailure(format!(
                    "{} returned {} embeddings for {} texts",
                    provider.provider_name(),
                    result.embeddings.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = result.embeddings.iter().find(|v| v.len() != dimensions) {
                return Err(AppError::ProviderFailure(format!(
                    "{} returned a {}-dimensional embedding, expected {}",
                    provider.provider_name(),
                    bad.len(),
                    dimensions
                )));
            }

            tracing::debug!("Embedded batch {} ({} texts)", i + 1, batch.len());
            usage.add(result.usage);
            embeddings.extend(result.embeddings);
        }

        Ok(EmbedOutcome {
            embeddings,
            dimensions,
            usage,
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
        })
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, provider: Option<&str>, query: &str) -> AppResult<Vec<f32>> {
        let outcome = self.embed_texts(provider, &[query.to_string()], Some(1)).await?;
        outcome
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ProviderFailure("No embedding returned".to_string()))
    }
}
