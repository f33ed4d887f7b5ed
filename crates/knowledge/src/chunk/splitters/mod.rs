//! Splitting policies for text that exceeds the chunk budget.

mod prose;
mod tabular;

pub use prose::ProseSplitter;
pub use tabular::TabularSplitter;

/// Trait for chunk splitters.
///
/// Implementations receive text already known to exceed `max_chars` and
/// return trimmed, non-empty chunks in document order.
pub trait ChunkSplitter {
    /// Split text into chunks of roughly `max_chars` chars.
    fn split(&self, text: &str, max_chars: usize) -> Vec<String>;
}
