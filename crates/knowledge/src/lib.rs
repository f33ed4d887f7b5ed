//! Document retrieval core.
//!
//! Splits documents into token-budgeted chunks, embeds them through a
//! configurable provider and answers top-K cosine-similarity queries from an
//! in-memory vector index.

pub mod chunk;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod service;
pub mod similarity;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk::{chunk_text, Chunk, ChunkPolicy, Chunker};
pub use embeddings::{EmbedOutcome, EmbeddingEngine, EmbeddingProvider, EmbeddingUsage};
pub use index::MemoryVectorIndex;
pub use service::{IndexChunk, IndexOutcome, IngestOutcome, KnowledgeService, SearchRequest};
pub use similarity::cosine_similarity;
pub use types::{LearnOptions, LearnStats};
pub use vector_index::{
    DeleteOutcome, DocumentFilter, IndexStats, Metadata, SearchHit, StoreOutcome, VectorIndex,
};

use docsift_core::AppResult;
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Ingest files and directories into the service.
///
/// Each file's path is its document id, so learning the same path twice
/// replaces its vectors. Files that cannot be parsed or indexed are logged
/// and skipped; only an unusable service configuration aborts the run.
pub async fn learn(service: &KnowledgeService, options: &LearnOptions) -> AppResult<LearnStats> {
    let start = Instant::now();

    tracing::info!("Starting learn operation for {} paths", options.paths.len());

    // Fail fast on a provider that cannot be built
    service.engine().provider(None)?;

    let mut stats = LearnStats::default();

    for path in &options.paths {
        if path.is_file() {
            process_file(service, path, options, &mut stats).await;
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && should_include(entry_path, options) {
                    process_file(service, entry_path, options, &mut stats).await;
                }
            }
        } else {
            tracing::warn!("Skipping missing path: {:?}", path);
            stats.skipped_count += 1;
        }
    }

    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Learn operation completed: {} sources, {} chunks, {} bytes, {} skipped in {:.2}s",
        stats.sources_count,
        stats.chunks_count,
        stats.bytes_processed,
        stats.skipped_count,
        stats.duration_secs
    );

    Ok(stats)
}

/// Parse, chunk and index one file, recording the outcome in `stats`.
async fn process_file(
    service: &KnowledgeService,
    path: &Path,
    options: &LearnOptions,
    stats: &mut LearnStats,
) {
    match ingest_file(service, path, options).await {
        Ok((chunks, bytes)) => {
            stats.sources_count += 1;
            stats.chunks_count += chunks;
            stats.bytes_processed += bytes;
        }
        Err(e) => {
            tracing::warn!("Skipping {:?}: {}", path, e);
            stats.skipped_count += 1;
        }
    }
}

async fn ingest_file(
    service: &KnowledgeService,
    path: &Path,
    options: &LearnOptions,
) -> AppResult<(u32, u64)> {
    tracing::debug!("Processing file: {:?}", path);

    let text = parser::parse_file(path)?;
    let file_type = chunk::file_type_from_path(path);
    let document_id = path.to_string_lossy();

    let outcome = service
        .ingest_document(&document_id, &text, file_type.as_deref(), options.max_tokens)
        .await?;

    tracing::debug!(
        "Processed {:?} as {}: {} chunks, {} bytes",
        path,
        parser::ContentType::from_path(path).as_str(),
        outcome.chunks_indexed,
        text.len()
    );

    Ok((outcome.chunks_indexed as u32, text.len() as u64))
}

/// Dot-files and dot-directories (`.git`, `.docsift`) below a learn root.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Check if a file should be included based on patterns.
fn should_include(path: &Path, options: &LearnOptions) -> bool {
    let path_str = path.to_string_lossy();

    // Check excludes first
    if options.exclude.iter().any(|p| path_str.contains(p.as_str())) {
        return false;
    }

    // If includes are specified, must match at least one
    options.include.is_empty() || options.include.iter().any(|p| path_str.contains(p.as_str()))
}
