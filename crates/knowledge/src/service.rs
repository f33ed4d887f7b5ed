//! Caller-facing retrieval operations.
//!
//! `KnowledgeService` owns the index and the embedding engine behind `Arc`s
//! so one instance can be shared across request handlers. Provider calls are
//! awaited before the index is touched, never while holding its lock.

use crate::chunk::{content_hash, Chunker};
use crate::embeddings::{EmbedOutcome, EmbeddingEngine};
use crate::vector_index::{
    DocumentFilter, IndexStats, Metadata, SearchHit, VectorIndex, ORIGINAL_DOCUMENT_ID,
};
use docsift_core::config::{ChunkingConfig, SearchConfig};
use docsift_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// One pre-chunked piece of a document to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexChunk {
    pub content: String,
    pub chunk_index: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOutcome {
    pub success: bool,
    pub chunks_indexed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub document_id: String,
    pub chunks_indexed: usize,
    pub total_chars: usize,
}

/// A similarity query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to `search.defaultLimit`
    pub limit: Option<usize>,
    /// Minimum score; falls back to `search.defaultThreshold`
    pub threshold: Option<f32>,
    /// Restrict to these source documents
    pub document_ids: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Chunk, embed, index and search documents.
pub struct KnowledgeService {
    index: Arc<dyn VectorIndex>,
    engine: Arc<EmbeddingEngine>,
    chunking: ChunkingConfig,
    search: SearchConfig,
}

impl KnowledgeService {
    pub fn new(index: Arc<dyn VectorIndex>, engine: Arc<EmbeddingEngine>) -> Self {
        Self {
            index,
            engine,
            chunking: ChunkingConfig::default(),
            search: SearchConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn engine(&self) -> &Arc<EmbeddingEngine> {
        &self.engine
    }

    /// Chunker configured from `chunking`, with an optional token budget override.
    pub fn chunker(&self, max_tokens: Option<usize>) -> Chunker {
        Chunker::new(max_tokens.unwrap_or(self.chunking.max_tokens))
            .with_chars_per_token(self.chunking.chars_per_token)
    }

    /// Embed raw texts without indexing them.
    pub async fn embed(
        &self,
        texts: &[String],
        provider: Option<&str>,
        batch_size: Option<usize>,
    ) -> AppResult<EmbedOutcome> {
        self.engine.embed_texts(provider, texts, batch_size).await
    }

    /// Embed and store pre-chunked content for `document_id`.
    ///
    /// Each chunk is stored under `"{document_id}_{chunk_index}"`. Caller
    /// metadata is kept; `originalDocumentId`, `chunkIndex`, `totalChunks`,
    /// `content` and `contentHash` are always set by the service.
    pub async fn index_chunks(
        &self,
        document_id: &str,
        chunks: Vec<IndexChunk>,
    ) -> AppResult<IndexOutcome> {
        if document_id.trim().is_empty() {
            return Err(AppError::InvalidInput("documentId is required".to_string()));
        }
        if chunks.is_empty() {
            return Err(AppError::InvalidInput(
                "chunks must be a non-empty array".to_string(),
            ));
        }
        if let Some(chunk) = chunks.iter().find(|c| c.content.trim().is_empty()) {
            return Err(AppError::InvalidInput(format!(
                "chunk {} has empty content",
                chunk.chunk_index
            )));
        }
        let mut seen = HashSet::with_capacity(chunks.len());
        if let Some(chunk) = chunks.iter().find(|c| !seen.insert(c.chunk_index)) {
            return Err(AppError::InvalidInput(format!(
                "duplicate chunkIndex {}",
                chunk.chunk_index
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let outcome = self.engine.embed_texts(None, &texts, None).await?;
        let chunks_indexed = self.store_chunks(document_id, chunks, outcome.embeddings)?;

        Ok(IndexOutcome {
            success: true,
            chunks_indexed,
        })
    }

    fn store_chunks(
        &self,
        document_id: &str,
        chunks: Vec<IndexChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> AppResult<usize> {
        let total_chunks = chunks.len();
        for (chunk, vector) in chunks.into_iter().zip(embeddings) {
            let id = format!("{}_{}", document_id, chunk.chunk_index);
            let mut metadata = chunk.metadata;
            metadata.insert(
                ORIGINAL_DOCUMENT_ID.to_string(),
                Value::String(document_id.to_string()),
            );
            metadata.insert("chunkIndex".to_string(), Value::from(chunk.chunk_index));
            metadata.insert("totalChunks".to_string(), Value::from(total_chunks));
            metadata.insert(
                "contentHash".to_string(),
                Value::String(content_hash(&chunk.content)),
            );
            metadata.insert("content".to_string(), Value::String(chunk.content));

            self.index.store(&id, vector, metadata)?;
        }

        tracing::info!(
            "Indexed {} chunks for document '{}'",
            total_chunks,
            document_id
        );

        Ok(total_chunks)
    }

    /// Chunk `text` and index the result for `document_id`.
    ///
    /// Replaces whatever was indexed for the document before.
    pub async fn ingest_document(
        &self,
        document_id: &str,
        text: &str,
        file_type: Option<&str>,
        max_tokens: Option<usize>,
    ) -> AppResult<IngestOutcome> {
        if document_id.trim().is_empty() {
            return Err(AppError::InvalidInput("documentId is required".to_string()));
        }

        let chunks: Vec<IndexChunk> = self
            .chunker(max_tokens)
            .chunk_document(text, file_type)?
            .into_iter()
            .map(|c| IndexChunk {
                content: c.content,
                chunk_index: c.index,
                metadata: Metadata::new(),
            })
            .collect();

        // A provider failure leaves the previous vectors untouched
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let outcome = self.engine.embed_texts(None, &texts, None).await?;

        let replaced = self.index.delete_document(document_id)?;
        if replaced > 0 {
            tracing::debug!("Replacing {} vectors for document '{}'", replaced, document_id);
        }
        let chunks_indexed = self.store_chunks(document_id, chunks, outcome.embeddings)?;

        Ok(IngestOutcome {
            document_id: document_id.to_string(),
            chunks_indexed,
            total_chars: text.chars().count(),
        })
    }

    /// Embed `request.query` and return the closest stored chunks.
    pub async fn search(&self, request: SearchRequest) -> AppResult<Vec<SearchHit>> {
        if request.query.trim().is_empty() {
            return Err(AppError::InvalidInput("query is required".to_string()));
        }

        let limit = request.limit.unwrap_or(self.search.default_limit);
        let threshold = request.threshold.or(self.search.default_threshold);
        // An empty id list means no filter
        let filter = request
            .document_ids
            .filter(|ids| !ids.is_empty())
            .map(DocumentFilter::new);

        let query = self.engine.embed_query(None, &request.query).await?;
        let mut hits = self.index.search(&query, limit, filter.as_ref())?;

        if let Some(threshold) = threshold {
            hits.retain(|hit| hit.score >= threshold);
        }

        tracing::info!(
            "Search returned {} results (limit {}, threshold {:?})",
            hits.len(),
            limit,
            threshold
        );

        Ok(hits)
    }

    /// Remove every vector of `document_id`. Returns how many were removed.
    pub fn delete_document(&self, document_id: &str) -> AppResult<usize> {
        let deleted = self.index.delete_document(document_id)?;
        tracing::info!("Deleted {} vectors for document '{}'", deleted, document_id);
        Ok(deleted)
    }

    pub fn stats(&self) -> AppResult<IndexStats> {
        self.index.stats()
    }
}
