//! docsift-server: the HTTP surface of the retrieval service.
//!
//! Wraps a shared `KnowledgeService` in an axum router. Every handler is a
//! thin translation between camelCase JSON and service calls; errors map to
//! status codes in `error`.

pub mod error;
pub mod routes;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use docsift_core::config::ServerConfig;
use docsift_core::{AppError, AppResult};
use docsift_knowledge::KnowledgeService;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ServerError;
pub use routes::SharedService;

/// Build the router with all endpoints.
pub fn router(service: SharedService, request_timeout: Duration) -> Router {
    Router::new()
        .route("/embed", post(routes::embed))
        .route("/index", post(routes::index))
        .route("/search", post(routes::search))
        .route("/documents", post(routes::ingest_document))
        .route(
            "/documents/:id/embeddings",
            delete(routes::delete_document),
        )
        .route("/chunk", post(routes::chunk))
        .route("/stats", get(routes::stats))
        .route("/health", get(routes::health))
        .with_state(service)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Bind to `config.host:config.port` and serve until Ctrl+C or SIGTERM.
pub async fn serve(service: Arc<KnowledgeService>, config: &ServerConfig) -> AppResult<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            AppError::Config(format!(
                "Invalid listen address {}:{}: {}",
                config.host, config.port, e
            ))
        })?;

    let app = router(service, Duration::from_secs(config.request_timeout_secs));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("docsift listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
