//! Token-budgeted chunking for prose and tabular text.
//!
//! The budget is `max_tokens * chars_per_token` chars. Text that fits is
//! returned whole; otherwise the policy chosen from the file type decides
//! how it is split:
//! - prose accumulates sentences and trims oversized ones at word boundaries
//! - tabular packs whole lines and never splits a row

mod boundary;
mod detection;
mod hash;
pub mod splitters;

pub use detection::{file_type_from_path, ChunkPolicy};
pub use hash::content_hash;

use docsift_core::config::ChunkingConfig;
use docsift_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use splitters::{ChunkSplitter, ProseSplitter, TabularSplitter};

/// Default token budget per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// Approximate characters per token used to derive the char budget.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// A chunk of a document with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Chunk text
    pub content: String,

    /// Position in the document (0-indexed)
    pub index: usize,

    /// Number of chunks the document produced
    pub total_chunks: usize,
}

/// Splits text into chunks that fit a token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_tokens: usize,
    chars_per_token: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl Chunker {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    pub fn with_chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.chars_per_token = chars_per_token;
        self
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_tokens).with_chars_per_token(config.chars_per_token)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Character budget per chunk.
    pub fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(self.chars_per_token)
    }

    /// Split `text` into chunks of at most `max_chars()` chars each.
    ///
    /// Text that already fits is returned unchanged. Tabular rows longer
    /// than the budget are emitted whole as their own chunk.
    pub fn chunk(&self, text: &str, file_type: Option<&str>) -> AppResult<Vec<String>> {
        let max_chars = self.max_chars();
        if max_chars == 0 {
            return Err(AppError::InvalidInput(
                "maxTokens must be greater than zero".to_string(),
            ));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("Text to chunk is empty".to_string()));
        }

        if text.chars().count() <= max_chars {
            return Ok(vec![text.to_string()]);
        }

        let policy = ChunkPolicy::from_file_type(file_type);
        let mut chunks = dispatch_splitter(policy).split(trimmed, max_chars);
        if chunks.is_empty() {
            chunks.push(trimmed.to_string());
        }

        tracing::debug!(
            "Chunked {} chars into {} {} chunks (budget {} chars)",
            trimmed.chars().count(),
            chunks.len(),
            policy.as_str(),
            max_chars
        );

        Ok(chunks)
    }

    /// Chunk `text` and attach positions.
    pub fn chunk_document(&self, text: &str, file_type: Option<&str>) -> AppResult<Vec<Chunk>> {
        let pieces = self.chunk(text, file_type)?;
        let total_chunks = pieces.len();

        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                index,
                total_chunks,
            })
            .collect())
    }
}

/// Chunk `text` with the default chars-per-token ratio.
pub fn chunk_text(text: &str, max_tokens: usize, file_type: Option<&str>) -> AppResult<Vec<String>> {
    Chunker::new(max_tokens).chunk(text, file_type)
}

fn dispatch_splitter(policy: ChunkPolicy) -> Box<dyn ChunkSplitter> {
    match policy {
        ChunkPolicy::Prose => Box::new(ProseSplitter),
        ChunkPolicy::Tabular => Box::new(TabularSplitter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_returned_unchanged() {
        let chunks = chunk_text("  A short note.  ", 10, None).unwrap();
        assert_eq!(chunks, vec!["  A short note.  "]);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        for text in ["", " \n\t "] {
            let err = chunk_text(text, 10, Some("csv")).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let err = chunk_text("anything", 0, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_max_chars() {
        assert_eq!(Chunker::new(512).max_chars(), 2048);
        assert_eq!(Chunker::new(10).with_chars_per_token(3).max_chars(), 30);
    }

    #[test]
    fn test_chunk_document_positions() {
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = Chunker::new(6).chunk_document(text, Some("txt")).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total_chunks, chunks.len());
        }
    }

    #[test]
    fn test_tabular_dispatch() {
        let rows: Vec<String> = (0..20).map(|i| format!("{},item-{},{}", i, i, i * 10)).collect();
        let text = rows.join("\n");
        let chunks = chunk_text(&text, 10, Some("text/csv")).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            for line in chunk.lines() {
                assert!(rows.iter().any(|r| r == line));
            }
        }
    }

    #[test]
    fn test_chunk_serializes_camel_case() {
        let chunk = Chunk {
            content: "x".to_string(),
            index: 0,
            total_chunks: 1,
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["totalChunks"], 1);
    }
}
