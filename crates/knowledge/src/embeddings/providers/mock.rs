//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::provider::{EmbeddingBatch, EmbeddingProvider, EmbeddingUsage};
use docsift_core::AppResult;
use std::collections::HashMap;

/// Vector length when the config names none.
pub const DEFAULT_DIMENSIONS: usize = 384;

const MODEL: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic provider for tests and development; no network.
///
/// Vectors are bags of hashed word trigrams, so texts sharing words score
/// high against each other. They carry no semantics beyond that.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Unit-length vector for `text`; all zeros when no word survives filtering.
    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *counts.entry(word).or_insert(0) += 1;
        }

        for (word, count) in counts {
            let count = count as f32;
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let slot = self.slot(window.iter().collect::<String>().as_bytes(), 37);
                vector[slot] += count.sqrt();
            }
            vector[self.slot(word.as_bytes(), 31)] += count;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }

    fn slot(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(multiplier).wrapping_add(u64::from(b)));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<EmbeddingBatch> {
        Ok(EmbeddingBatch {
            embeddings: texts.iter().map(|text| self.vectorize(text)).collect(),
            usage: EmbeddingUsage::estimate(texts),
        })
    }
}
