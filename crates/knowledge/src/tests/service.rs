//! End-to-end service behaviour over the offline mock provider.

use crate::embeddings::{EmbeddingBatch, EmbeddingEngine, EmbeddingProvider};
use crate::index::MemoryVectorIndex;
use crate::service::{IndexChunk, KnowledgeService, SearchRequest};
use crate::types::LearnOptions;
use crate::vector_index::{Metadata, VectorIndex};
use async_trait::async_trait;
use docsift_core::config::{AppConfig, SearchConfig};
use docsift_core::{AppError, AppResult};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn test_service() -> KnowledgeService {
    let mut config = AppConfig::default();
    config.embedding.batch_delay_ms = 0;
    let engine = Arc::new(EmbeddingEngine::new(config));
    KnowledgeService::new(Arc::new(MemoryVectorIndex::new()), engine)
}

fn chunk(content: &str, chunk_index: usize) -> IndexChunk {
    IndexChunk {
        content: content.to_string(),
        chunk_index,
        metadata: Metadata::new(),
    }
}

/// Fails every call, standing in for an unreachable provider.
#[derive(Debug)]
struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        384
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<EmbeddingBatch> {
        Err(AppError::ProviderFailure("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_index_chunks_sets_ids_and_metadata() {
    let service = test_service();
    let mut first = chunk("Ownership moves values between bindings.", 0);
    first.metadata.insert("title".to_string(), json!("Rust book"));
    first
        .metadata
        .insert("originalDocumentId".to_string(), json!("spoofed"));

    let outcome = service
        .index_chunks("book", vec![first, chunk("Borrowing lends a reference.", 1)])
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.chunks_indexed, 2);

    let stats = service.stats().unwrap();
    assert_eq!(stats.total_vectors, 2);
    assert_eq!(stats.dimensions, Some(384));

    let hits = service
        .search(SearchRequest::new("ownership moves values"))
        .await
        .unwrap();
    assert_eq!(hits[0].id, "book_0");
    assert_eq!(hits[0].metadata["originalDocumentId"], json!("book"));
    assert_eq!(hits[0].metadata["title"], json!("Rust book"));
    assert_eq!(hits[0].metadata["chunkIndex"], json!(0));
    assert_eq!(hits[0].metadata["totalChunks"], json!(2));
    assert_eq!(
        hits[0].metadata["content"],
        json!("Ownership moves values between bindings.")
    );
    assert_eq!(hits[0].metadata["contentHash"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_index_chunks_rejects_bad_input() {
    let service = test_service();

    let err = service.index_chunks("", vec![chunk("text", 0)]).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = service.index_chunks("doc", Vec::new()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = service
        .index_chunks("doc", vec![chunk("fine", 0), chunk("   ", 1)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("chunk 1"));

    assert_eq!(service.stats().unwrap().total_vectors, 0);
}

#[tokio::test]
async fn test_index_chunks_rejects_duplicate_chunk_index() {
    let service = test_service();

    let err = service
        .index_chunks(
            "doc",
            vec![chunk("first", 0), chunk("second", 1), chunk("third", 1)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(err.to_string().contains("duplicate chunkIndex 1"));
    assert_eq!(service.stats().unwrap().total_vectors, 0);
}

#[tokio::test]
async fn test_search_ranks_matching_document_first() {
    let service = test_service();
    service
        .ingest_document(
            "rust",
            "Rust ownership rules guarantee memory safety without garbage collection.",
            None,
            None,
        )
        .await
        .unwrap();
    service
        .ingest_document(
            "pasta",
            "Boil salted water, then cook spaghetti until tender and drain.",
            None,
            None,
        )
        .await
        .unwrap();

    let hits = service
        .search(SearchRequest::new("memory safety and ownership in Rust"))
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata["originalDocumentId"], json!("rust"));
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn test_search_threshold_and_filter() {
    let service = test_service();
    service
        .index_chunks("a", vec![chunk("vector search ranks chunks", 0)])
        .await
        .unwrap();
    service
        .index_chunks("b", vec![chunk("vector search ranks chunks", 0)])
        .await
        .unwrap();
    service
        .index_chunks("c", vec![chunk("completely unrelated gardening tips", 0)])
        .await
        .unwrap();

    let request = SearchRequest {
        threshold: Some(0.99),
        ..SearchRequest::new("vector search ranks chunks")
    };
    let hits = service.search(request).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a_0", "b_0"]);

    let request = SearchRequest {
        document_ids: Some(vec!["b".to_string(), "c".to_string()]),
        ..SearchRequest::new("vector search ranks chunks")
    };
    let hits = service.search(request).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["b_0", "c_0"]);

    let request = SearchRequest {
        document_ids: Some(Vec::new()),
        ..SearchRequest::new("vector search ranks chunks")
    };
    assert_eq!(service.search(request).await.unwrap().len(), 3);

    let request = SearchRequest {
        limit: Some(1),
        ..SearchRequest::new("vector search ranks chunks")
    };
    assert_eq!(service.search(request).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_uses_configured_defaults() {
    let service = test_service().with_search(SearchConfig {
        default_limit: 2,
        default_threshold: Some(0.5),
    });
    for doc in ["one", "two", "three"] {
        service
            .index_chunks(doc, vec![chunk("identical chunk content here", 0)])
            .await
            .unwrap();
    }
    service
        .index_chunks("other", vec![chunk("nothing shared whatsoever", 0)])
        .await
        .unwrap();

    let hits = service
        .search(SearchRequest::new("identical chunk content here"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.score >= 0.5));
}

#[tokio::test]
async fn test_search_rejects_blank_query() {
    let service = test_service();
    let err = service.search(SearchRequest::new("  ")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_ingest_replaces_previous_chunks() {
    let service = test_service();
    let long_text = "Sentence about indexing vectors. ".repeat(20);

    let first = service
        .ingest_document("doc", &long_text, None, Some(8))
        .await
        .unwrap();
    assert!(first.chunks_indexed > 1);
    assert_eq!(service.stats().unwrap().total_vectors, first.chunks_indexed);

    let second = service
        .ingest_document("doc", "Now a single short chunk.", None, None)
        .await
        .unwrap();
    assert_eq!(second.chunks_indexed, 1);
    assert_eq!(second.total_chars, 25);
    assert_eq!(service.stats().unwrap().total_vectors, 1);
}

#[tokio::test]
async fn test_failed_ingest_keeps_previous_vectors() {
    let mut config = AppConfig::default();
    config.embedding.batch_delay_ms = 0;
    let index = Arc::new(MemoryVectorIndex::new());

    let working = KnowledgeService::new(index.clone(), Arc::new(EmbeddingEngine::new(config.clone())));
    working
        .ingest_document("doc", "Original content stays put.", None, None)
        .await
        .unwrap();

    let engine = EmbeddingEngine::new(config).with_provider("mock", Arc::new(FailingProvider));
    let broken = KnowledgeService::new(index.clone(), Arc::new(engine));
    let err = broken
        .ingest_document("doc", "Replacement content.", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ProviderFailure(_)));
    assert_eq!(index.len(), 1);
    let entry = index.get("doc_0").unwrap();
    assert_eq!(entry.metadata["content"], json!("Original content stays put."));
}

#[tokio::test]
async fn test_delete_document_removes_only_its_chunks() {
    let service = test_service();
    service
        .index_chunks("keep", vec![chunk("kept chunk", 0)])
        .await
        .unwrap();
    service
        .index_chunks(
            "drop",
            vec![chunk("first dropped", 0), chunk("second dropped", 1)],
        )
        .await
        .unwrap();

    assert_eq!(service.delete_document("drop").unwrap(), 2);
    assert_eq!(service.delete_document("drop").unwrap(), 0);

    let hits = service
        .search(SearchRequest::new("dropped chunk"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "keep_0");
    assert_eq!(service.index().stats().unwrap().total_vectors, 1);
}

#[tokio::test]
async fn test_embed_reports_provider_and_usage() {
    let service = test_service();
    let texts = vec!["first text".to_string(), "second text".to_string()];

    let outcome = service.embed(&texts, None, Some(1)).await.unwrap();
    assert_eq!(outcome.embeddings.len(), 2);
    assert_eq!(outcome.dimensions, 384);
    assert_eq!(outcome.provider, "mock");
    assert!(outcome.usage.total_tokens > 0);
}

#[tokio::test]
async fn test_learn_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::write(root.join("guide.md"), "# Guide\n\nInstall the tool first.\n").unwrap();
    std::fs::write(root.join("notes.txt"), "Plain notes about deployment.").unwrap();
    std::fs::write(root.join("prices.csv"), "item,price\napple,1\npear,2\n").unwrap();
    std::fs::write(root.join("image.bin"), [0u8, 159, 146, 150]).unwrap();
    std::fs::create_dir(root.join(".git")).unwrap();
    std::fs::write(root.join(".git").join("HEAD"), "ref: refs/heads/main").unwrap();

    let service = test_service();
    let stats = crate::learn(&service, &LearnOptions::new(vec![root.to_path_buf()]))
        .await
        .unwrap();

    assert_eq!(stats.sources_count, 3);
    assert_eq!(stats.chunks_count, 3);
    assert_eq!(stats.skipped_count, 1);
    assert_eq!(service.stats().unwrap().total_vectors, 3);

    let hits = service
        .search(SearchRequest::new("install the tool"))
        .await
        .unwrap();
    let guide = root.join("guide.md").to_string_lossy().to_string();
    assert_eq!(hits[0].metadata["originalDocumentId"], json!(guide));
}

#[tokio::test]
async fn test_learn_include_exclude_and_missing_paths() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::write(root.join("keep.md"), "Keep this document.").unwrap();
    std::fs::write(root.join("skip.md"), "Skip this document.").unwrap();
    std::fs::write(root.join("other.txt"), "Not included by pattern.").unwrap();

    let options = LearnOptions {
        include: vec![".md".to_string()],
        exclude: vec!["skip".to_string()],
        ..LearnOptions::new(vec![root.to_path_buf(), root.join("missing")])
    };

    let service = test_service();
    let stats = crate::learn(&service, &options).await.unwrap();

    assert_eq!(stats.sources_count, 1);
    assert_eq!(stats.skipped_count, 1);
}

#[tokio::test]
async fn test_learn_fails_fast_on_unknown_provider() {
    let mut config = AppConfig::default();
    config.provider = "nope".to_string();
    let service = KnowledgeService::new(
        Arc::new(MemoryVectorIndex::new()),
        Arc::new(EmbeddingEngine::new(config)),
    );

    let err = crate::learn(&service, &LearnOptions::new(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}
