//! Ask command handler.
//!
//! Indexes the given paths into a throwaway in-memory index, then runs one
//! similarity search against it.

use clap::Args;
use docsift_core::{config::AppConfig, AppError, AppResult};
use docsift_knowledge::{LearnOptions, SearchRequest};
use std::path::PathBuf;

/// Index files in memory and search them
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Query text
    pub query: String,

    /// Files or directories to search
    #[arg(long, required = true)]
    pub path: Vec<PathBuf>,

    /// Number of chunks to return
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Minimum similarity score
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let service = super::build_service(config)?;
        let stats = docsift_knowledge::learn(&service, &LearnOptions::new(self.path.clone())).await?;

        if stats.chunks_count == 0 {
            return Err(AppError::Knowledge(format!(
                "Nothing indexed from {:?} ({} files skipped)",
                self.path, stats.skipped_count
            )));
        }

        let request = SearchRequest {
            limit: self.top_k,
            threshold: self.threshold,
            ..SearchRequest::new(self.query.clone())
        };
        let hits = service.search(request).await?;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "results": hits,
                "learned": stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No matches.");
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            let source = hit
                .metadata
                .get("originalDocumentId")
                .and_then(|v| v.as_str())
                .unwrap_or(hit.id.as_str());
            let content = hit
                .metadata
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            println!("{}. {} (score {:.3})", rank + 1, source, hit.score);
            println!("   {}", preview(content, 200));
        }

        Ok(())
    }
}

/// First `max_chars` chars of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
