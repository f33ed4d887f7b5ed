//! Chunk command handler.

use clap::Args;
use docsift_core::{config::AppConfig, AppResult};
use docsift_knowledge::{chunk, parser, Chunk, Chunker};
use std::path::PathBuf;

/// Print the chunks a file would be split into
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// File to chunk
    pub path: PathBuf,

    /// Token budget per chunk (default from config)
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// File type or MIME type; detected from the extension when omitted
    #[arg(long)]
    pub file_type: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let chunks = self.chunks(config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        } else {
            for chunk in &chunks {
                println!(
                    "--- chunk {}/{} ({} chars) ---",
                    chunk.index + 1,
                    chunk.total_chunks,
                    chunk.content.chars().count()
                );
                println!("{}", chunk.content);
            }
        }

        Ok(())
    }

    fn chunks(&self, config: &AppConfig) -> AppResult<Vec<Chunk>> {
        let text = parser::parse_file(&self.path)?;
        let file_type = self
            .file_type
            .clone()
            .or_else(|| chunk::file_type_from_path(&self.path));

        let chunker = Chunker::from_config(&config.chunking);
        let chunker = match self.max_tokens {
            Some(max_tokens) => {
                Chunker::new(max_tokens).with_chars_per_token(config.chunking.chars_per_token)
            }
            None => chunker,
        };

        tracing::info!(
            "Chunking {:?} as {} (budget {} chars)",
            self.path,
            file_type.as_deref().unwrap_or("prose"),
            chunker.max_chars()
        );

        chunker.chunk_document(&text, file_type.as_deref())
    }
}
