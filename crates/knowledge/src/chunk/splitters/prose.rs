//! Sentence-accumulating splitter for prose.

use super::ChunkSplitter;
use crate::chunk::boundary::split_to_budget;

/// Percentage of the budget a chunk may fill before the next sentence forces a flush.
const FLUSH_MARGIN_PERCENT: usize = 90;

/// Accumulates sentences until the next one would overrun ~90% of the budget.
///
/// Chunks still over budget after accumulation (a single long sentence) are
/// split on word boundaries.
pub struct ProseSplitter;

impl ChunkSplitter for ProseSplitter {
    fn split(&self, text: &str, max_chars: usize) -> Vec<String> {
        let soft_limit = soft_limit(max_chars);

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for sentence in split_sentences(text) {
            let sentence_chars = sentence.chars().count();

            if !current.is_empty() && current_chars + 1 + sentence_chars > soft_limit {
                flush(&mut chunks, &mut current, max_chars);
                current_chars = 0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_chars += 1;
            }
            current.push_str(sentence);
            current_chars += sentence_chars;
        }

        flush(&mut chunks, &mut current, max_chars);

        tracing::debug!(
            "Prose splitter created {} chunks from {} bytes (budget {} chars)",
            chunks.len(),
            text.len(),
            max_chars
        );

        chunks
    }
}

fn soft_limit(max_chars: usize) -> usize {
    (max_chars.saturating_mul(FLUSH_MARGIN_PERCENT) / 100).max(1)
}

fn flush(chunks: &mut Vec<String>, current: &mut String, max_chars: usize) {
    let text = current.trim();
    if text.chars().count() > max_chars {
        chunks.extend(split_to_budget(text, max_chars));
    } else if !text.is_empty() {
        chunks.push(text.to_string());
    }
    current.clear();
}

/// Split at `.`, `!` or `?` followed by whitespace. Terminators stay with
/// their sentence; the trailing fragment is kept even without a terminator.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let end = i + c.len_utf8();
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}
