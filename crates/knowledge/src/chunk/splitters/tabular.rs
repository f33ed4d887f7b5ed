//! Line-accumulating splitter for CSV and spreadsheet exports.

use super::ChunkSplitter;

/// Packs whole lines into chunks; a row is never split across chunks.
///
/// A single line longer than the budget becomes its own oversized chunk.
pub struct TabularSplitter;

impl ChunkSplitter for TabularSplitter {
    fn split(&self, text: &str, max_chars: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for line in text.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let line_chars = line.chars().count();

            if !current.is_empty() && current_chars + 1 + line_chars > max_chars {
                push_chunk(&mut chunks, &current);
                current.clear();
                current_chars = 0;
            }

            if !current.is_empty() {
                current.push('\n');
                current_chars += 1;
            }
            current.push_str(line);
            current_chars += line_chars;
        }

        push_chunk(&mut chunks, &current);

        tracing::debug!(
            "Tabular splitter created {} chunks from {} bytes (budget {} chars)",
            chunks.len(),
            text.len(),
            max_chars
        );

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
