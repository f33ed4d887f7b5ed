//! Vector index abstraction for chunk embeddings.
//!
//! Defines a trait for backend-agnostic vector storage and retrieval.

use docsift_core::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Free-form metadata attached to a stored vector.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key linking a vector to its source document.
pub const ORIGINAL_DOCUMENT_ID: &str = "originalDocumentId";

/// Result of a `store` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub success: bool,
    pub id: String,
}

/// Result of a `delete` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,

    /// Whether the id was present before the call
    pub existed: bool,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_vectors: usize,

    /// Dimension of stored vectors, if any have been stored
    pub dimensions: Option<usize>,

    /// `count * dimension * 4`; an estimate, not a measurement
    pub approx_memory_usage_bytes: usize,
}

/// Allow-list of source document ids for filtered search.
///
/// Ids are compared by string form, so a numeric `originalDocumentId` of `1`
/// matches the filter entry `"1"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter(HashSet<String>);

impl DocumentFilter {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the metadata's `originalDocumentId` is in the allow-list.
    /// Entries without the key never match.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        document_id_of(metadata).is_some_and(|id| self.0.contains(&id))
    }
}

/// String form of `metadata.originalDocumentId` (JSON string or number).
pub fn document_id_of(metadata: &Metadata) -> Option<String> {
    match metadata.get(ORIGINAL_DOCUMENT_ID)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Trait for vector index backends.
///
/// All methods take `&self`; implementations guard their own state so one
/// index can be shared behind an `Arc` across request handlers.
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite the vector stored under `id`.
    fn store(&self, id: &str, vector: Vec<f32>, metadata: Metadata) -> AppResult<StoreOutcome>;

    /// Top-`limit` entries by descending cosine similarity to `query`,
    /// restricted to `filter` when given. Ties keep insertion order.
    fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&DocumentFilter>,
    ) -> AppResult<Vec<SearchHit>>;

    /// Remove the entry for `id`. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> AppResult<DeleteOutcome>;

    /// Remove every entry whose `originalDocumentId` equals `document_id`.
    ///
    /// Returns the number of entries removed.
    fn delete_document(&self, document_id: &str) -> AppResult<usize>;

    /// Get statistics about the index.
    fn stats(&self) -> AppResult<IndexStats>;

    /// Remove all entries.
    fn clear(&self) -> AppResult<()>;
}
