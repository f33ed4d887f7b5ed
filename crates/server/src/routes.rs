//! HTTP endpoints.
//!
//! Endpoints:
//! - POST   /embed                      - embed raw texts
//! - POST   /index                      - embed and store pre-chunked content
//! - POST   /search                     - top-K similarity search
//! - DELETE /documents/:id/embeddings   - drop every vector of a document
//! - GET    /stats                      - index statistics
//! - POST   /chunk                      - chunk text without indexing
//! - POST   /documents                  - chunk, embed and store a document
//! - GET    /health                     - liveness check

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use docsift_knowledge::{EmbedOutcome, IndexOutcome, KnowledgeService, SearchRequest};

use crate::error::ServerError;
use crate::types::{
    ChunkRequest, ChunkResponse, DeleteResponse, DocumentRequest, DocumentResponse, EmbedRequest,
    HealthResponse, IndexRequest, SearchBody, SearchResponse, StatsResponse,
};

/// Shared handler state.
pub type SharedService = Arc<KnowledgeService>;

type JsonBody<T> = Result<Json<T>, JsonRejection>;

pub async fn embed(
    State(service): State<SharedService>,
    body: JsonBody<EmbedRequest>,
) -> Result<Json<EmbedOutcome>, ServerError> {
    let Json(req) = body?;

    let outcome = service
        .embed(&req.texts, req.provider.as_deref(), req.batch_size)
        .await?;

    Ok(Json(outcome))
}

pub async fn index(
    State(service): State<SharedService>,
    body: JsonBody<IndexRequest>,
) -> Result<Json<IndexOutcome>, ServerError> {
    let Json(req) = body?;

    let outcome = service
        .index_chunks(&req.document_id.into_string(), req.chunks)
        .await?;

    Ok(Json(outcome))
}

pub async fn search(
    State(service): State<SharedService>,
    body: JsonBody<SearchBody>,
) -> Result<Json<SearchResponse>, ServerError> {
    let Json(req) = body?;

    let request = SearchRequest {
        query: req.query,
        limit: req.limit,
        threshold: req.threshold,
        document_ids: req
            .document_ids
            .map(|ids| ids.into_iter().map(|id| id.into_string()).collect()),
    };
    let results = service.search(request).await?;

    Ok(Json(SearchResponse { results }))
}

pub async fn delete_document(
    State(service): State<SharedService>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let deleted_count = service.delete_document(&document_id)?;

    Ok(Json(DeleteResponse {
        success: true,
        deleted_count,
    }))
}

pub async fn stats(State(service): State<SharedService>) -> Result<Json<StatsResponse>, ServerError> {
    Ok(Json(service.stats()?.into()))
}

pub async fn chunk(
    State(service): State<SharedService>,
    body: JsonBody<ChunkRequest>,
) -> Result<Json<ChunkResponse>, ServerError> {
    let Json(req) = body?;

    let chunks = service
        .chunker(req.max_tokens)
        .chunk_document(&req.text, req.file_type.as_deref())?;

    Ok(Json(ChunkResponse { chunks }))
}

pub async fn ingest_document(
    State(service): State<SharedService>,
    body: JsonBody<DocumentRequest>,
) -> Result<Json<DocumentResponse>, ServerError> {
    let Json(req) = body?;

    let outcome = service
        .ingest_document(
            &req.document_id.into_string(),
            &req.text,
            req.file_type.as_deref(),
            req.max_tokens,
        )
        .await?;

    Ok(Json(DocumentResponse {
        success: true,
        document_id: outcome.document_id,
        chunks_indexed: outcome.chunks_indexed,
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
