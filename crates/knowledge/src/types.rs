//! Directory ingestion types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for the learn operation.
#[derive(Debug, Clone, Default)]
pub struct LearnOptions {
    /// Files or directories to ingest
    pub paths: Vec<PathBuf>,

    /// Path substrings a file must contain (any of); empty means all files
    pub include: Vec<String>,

    /// Path substrings that exclude a file
    pub exclude: Vec<String>,

    /// Token budget override for chunking
    pub max_tokens: Option<usize>,
}

impl LearnOptions {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }
}

/// Statistics from a learn operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnStats {
    /// Number of files ingested
    pub sources_count: u32,

    /// Number of chunks indexed
    pub chunks_count: u32,

    /// Total bytes of extracted text
    pub bytes_processed: u64,

    /// Files that could not be read or indexed
    pub skipped_count: u32,

    /// Duration in seconds
    pub duration_secs: f64,
}
