//! Serve command handler.

use clap::Args;
use docsift_core::{config::AppConfig, AppResult};
use docsift_knowledge::LearnOptions;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long, env = "DOCSIFT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "DOCSIFT_PORT")]
    pub port: Option<u16>,

    /// Files or directories to index before accepting requests
    #[arg(long)]
    pub preload: Vec<PathBuf>,
}

impl ServeCommand {
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let service = super::build_service(&config)?;

        if !self.preload.is_empty() {
            let stats = docsift_knowledge::learn(&service, &LearnOptions::new(self.preload.clone()))
                .await?;
            tracing::info!(
                "Preloaded {} sources ({} chunks, {} skipped)",
                stats.sources_count,
                stats.chunks_count,
                stats.skipped_count
            );
        }

        docsift_server::serve(Arc::new(service), &config.server).await
    }
}
