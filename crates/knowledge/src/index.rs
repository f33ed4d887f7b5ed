//! In-memory vector index with exhaustive cosine-similarity search.
//!
//! Searches take the read lock and may run in parallel; stores and deletes
//! take the write lock. There is no snapshot isolation: a search racing a
//! store or delete observes either the old or the new entry. Concurrent
//! stores to one id resolve as last write wins.

use crate::similarity::cosine_similarity;
use crate::vector_index::{
    document_id_of, DeleteOutcome, DocumentFilter, IndexStats, Metadata, SearchHit, StoreOutcome,
    VectorIndex,
};
use chrono::{DateTime, Utc};
use docsift_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored vector with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Slot {
    entry: VectorEntry,

    /// Insertion order; kept across overwrites for tie-breaking
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Slot>,
    next_seq: u64,
    dimension: Option<usize>,
}

/// Process-local vector index.
///
/// All vectors share one dimension: the one pinned at construction, or else
/// the dimension of the first vector stored. An unpinned index forgets its
/// dimension once it is empty again.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    state: RwLock<State>,
    pinned_dimension: Option<usize>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index that only accepts vectors of `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            state: RwLock::new(State {
                dimension: Some(dimension),
                ..State::default()
            }),
            pinned_dimension: Some(dimension),
        }
    }

    /// Copy of the entry stored under `id`.
    pub fn get(&self, id: &str) -> Option<VectorEntry> {
        self.read().entries.get(id).map(|slot| slot.entry.clone())
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn forget_dimension_if_empty(&self, state: &mut State) {
        if state.entries.is_empty() {
            state.dimension = self.pinned_dimension;
        }
    }
}

fn all_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

impl VectorIndex for MemoryVectorIndex {
    fn store(&self, id: &str, vector: Vec<f32>, metadata: Metadata) -> AppResult<StoreOutcome> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Vector id must not be empty".to_string()));
        }
        if vector.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Vector for '{}' must not be empty",
                id
            )));
        }
        if !all_finite(&vector) {
            return Err(AppError::InvalidInput(format!(
                "Vector for '{}' contains NaN or infinite components",
                id
            )));
        }

        let mut state = self.write();

        if let Some(expected) = state.dimension {
            if expected != vector.len() {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        state.dimension = Some(vector.len());

        let existing_seq = state.entries.get(id).map(|slot| slot.seq);
        let seq = match existing_seq {
            Some(seq) => seq,
            None => {
                let seq = state.next_seq;
                state.next_seq += 1;
                seq
            }
        };

        let entry = VectorEntry {
            id: id.to_string(),
            vector,
            metadata,
            inserted_at: Utc::now(),
        };
        state.entries.insert(id.to_string(), Slot { entry, seq });

        tracing::trace!("Stored vector '{}' ({} total)", id, state.entries.len());

        Ok(StoreOutcome {
            success: true,
            id: id.to_string(),
        })
    }

    fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&DocumentFilter>,
    ) -> AppResult<Vec<SearchHit>> {
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Query vector must not be empty".to_string(),
            ));
        }
        if !all_finite(query) {
            return Err(AppError::InvalidInput(
                "Query vector contains NaN or infinite components".to_string(),
            ));
        }

        let state = self.read();

        if let Some(expected) = state.dimension {
            if expected != query.len() {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        if limit == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u64, f32, &VectorEntry)> = Vec::new();
        for slot in state.entries.values() {
            if let Some(filter) = filter {
                if !filter.matches(&slot.entry.metadata) {
                    continue;
                }
            }
            let score = cosine_similarity(query, &slot.entry.vector)?;
            scored.push((slot.seq, score, &slot.entry));
        }

        // Insertion order first, then a stable sort by score keeps ties in that order
        scored.sort_by_key(|(seq, _, _)| *seq);
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        tracing::debug!(
            "Retrieved {} of {} vectors (requested top-{}, filtered: {})",
            scored.len(),
            state.entries.len(),
            limit,
            filter.is_some()
        );

        Ok(scored
            .into_iter()
            .map(|(_, score, entry)| SearchHit {
                id: entry.id.clone(),
                score,
                metadata: entry.metadata.clone(),
            })
            .collect())
    }

    fn delete(&self, id: &str) -> AppResult<DeleteOutcome> {
        let mut state = self.write();
        let existed = state.entries.remove(id).is_some();
        self.forget_dimension_if_empty(&mut state);

        Ok(DeleteOutcome {
            success: true,
            existed,
        })
    }

    fn delete_document(&self, document_id: &str) -> AppResult<usize> {
        let mut state = self.write();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, slot| document_id_of(&slot.entry.metadata).as_deref() != Some(document_id));
        let removed = before - state.entries.len();
        self.forget_dimension_if_empty(&mut state);

        tracing::debug!("Deleted {} vectors for document '{}'", removed, document_id);
        Ok(removed)
    }

    fn stats(&self) -> AppResult<IndexStats> {
        let state = self.read();
        let total_vectors = state.entries.len();
        let dimensions = state.dimension;

        Ok(IndexStats {
            total_vectors,
            dimensions,
            approx_memory_usage_bytes: total_vectors * dimensions.unwrap_or(0) * 4,
        })
    }

    fn clear(&self) -> AppResult<()> {
        let mut state = self.write();
        state.entries.clear();
        self.forget_dimension_if_empty(&mut state);

        tracing::info!("Cleared vector index");
        Ok(())
    }
}
