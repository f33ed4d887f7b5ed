//! Request and response bodies. All field names are camelCase on the wire.

use docsift_knowledge::{Chunk, IndexChunk, IndexStats, SearchHit};
use serde::{Deserialize, Serialize};

/// A document id sent as either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Text(String),
    Number(serde_json::Number),
}

impl DocumentId {
    pub fn into_string(self) -> String {
        match self {
            DocumentId::Text(s) => s,
            DocumentId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedRequest {
    pub texts: Vec<String>,
    pub provider: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub document_id: DocumentId,
    pub chunks: Vec<IndexChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub query: String,
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
    pub document_ids: Option<Vec<DocumentId>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_vectors: usize,
    /// Estimated bytes held by vector payloads
    pub memory_usage: usize,
    pub dimensions: Option<usize>,
}

impl From<IndexStats> for StatsResponse {
    fn from(stats: IndexStats) -> Self {
        Self {
            total_vectors: stats.total_vectors,
            memory_usage: stats.approx_memory_usage_bytes,
            dimensions: stats.dimensions,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest {
    pub text: String,
    pub max_tokens: Option<usize>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub document_id: DocumentId,
    pub text: String,
    pub file_type: Option<String>,
    pub max_tokens: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub success: bool,
    pub document_id: String,
    pub chunks_indexed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
