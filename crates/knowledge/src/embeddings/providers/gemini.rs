//! Google Gemini embeddings provider.
//!
//! Uses `batchEmbedContents`, which takes every text of a batch in one
//! request. The API reports no token usage, so usage is estimated.

use super::http::{build_client, post_json};
use crate::embeddings::provider::{EmbeddingBatch, EmbeddingProvider, EmbeddingUsage};
use async_trait::async_trait;
use docsift_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DIMENSIONS: usize = 768;

/// Gemini embedding provider.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: &str,
        endpoint: Option<&str>,
        dimensions: Option<usize>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_client("gemini", None)?,
            api_key,
            endpoint: endpoint
                .unwrap_or(DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            model: model.trim_start_matches("models/").to_string(),
            dimensions: dimensions.unwrap_or(DEFAULT_DIMENSIONS),
        })
    }

    fn build_request(&self, texts: &[String]) -> BatchRequest {
        let model = format!("models/{}", self.model);
        BatchRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: model.clone(),
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                })
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "gemini", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch::default());
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.endpoint, self.model, self.api_key
        );

        let response: BatchResponse =
            post_json(&self.client, "gemini", &url, None, &self.build_request(texts)).await?;

        if response.embeddings.len() != texts.len() {
            return Err(AppError::ProviderFailure(format!(
                "gemini: expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        debug!("Generated {} embeddings", response.embeddings.len());

        Ok(EmbeddingBatch {
            embeddings: response.embeddings.into_iter().map(|e| e.values).collect(),
            usage: EmbeddingUsage::estimate(texts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new("key".to_string(), "models/text-embedding-004", None, None).unwrap()
    }

    #[test]
    fn test_model_prefix_is_normalized() {
        let provider = provider();
        assert_eq!(provider.model_name(), "text-embedding-004");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_request_shape() {
        let request = provider().build_request(&["hello".to_string()]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"][0]["model"], "models/text-embedding-004");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let response: BatchResponse = serde_json::from_value(serde_json::json!({
            "embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]
        }))
        .unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }
}
