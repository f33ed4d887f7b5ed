//! Command handlers for the docsift CLI.

pub mod ask;
pub mod chunk;
pub mod serve;

pub use ask::AskCommand;
pub use chunk::ChunkCommand;
pub use serve::ServeCommand;

use docsift_core::{config::AppConfig, AppResult};
use docsift_knowledge::{EmbeddingEngine, KnowledgeService, MemoryVectorIndex};
use std::sync::Arc;

/// Service over an empty in-memory index, configured from `config`.
pub fn build_service(config: &AppConfig) -> AppResult<KnowledgeService> {
    config.validate()?;

    let engine = EmbeddingEngine::new(config.clone());
    Ok(
        KnowledgeService::new(Arc::new(MemoryVectorIndex::new()), Arc::new(engine))
            .with_chunking(config.chunking.clone())
            .with_search(config.search.clone()),
    )
}
