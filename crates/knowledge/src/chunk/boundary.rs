//! Word-boundary trimming for chunks that overrun the character budget.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into pieces of at most `max_chars` chars each.
///
/// Each cut walks back from the budget to the nearest whitespace. Without
/// whitespace the cut falls exactly on the budget, on a grapheme boundary.
/// Nothing but whitespace is lost between pieces.
pub(crate) fn split_to_budget(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if rest.chars().count() <= max_chars {
            pieces.push(rest.to_string());
            break;
        }

        let (head, tail) = cut_at_word_boundary(rest, max_chars);
        let head = head.trim_end();
        if !head.is_empty() {
            pieces.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    pieces
}

/// Cut `text` (no leading whitespace) at or before `max_chars`.
fn cut_at_word_boundary(text: &str, max_chars: usize) -> (&str, &str) {
    let cutoff = grapheme_cutoff(text, max_chars);
    let (head, tail) = text.split_at(cutoff);

    // A word ends exactly at the cutoff
    if tail.starts_with(char::is_whitespace) {
        return (head, tail);
    }

    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => text.split_at(pos),
        _ => (head, tail),
    }
}

/// Byte offset after the longest run of whole graphemes totalling at most
/// `max_chars` chars. Always covers at least one grapheme.
fn grapheme_cutoff(text: &str, max_chars: usize) -> usize {
    let mut chars = 0;
    let mut end = 0;

    for (offset, grapheme) in text.grapheme_indices(true) {
        let len = grapheme.chars().count();
        if chars + len > max_chars && end > 0 {
            break;
        }
        chars += len;
        end = offset + grapheme.len();
        if chars >= max_chars {
            break;
        }
    }

    end
}
