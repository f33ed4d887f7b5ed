//! File type detection for choosing a chunking policy.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions whose content is one record per line.
const TABULAR_EXTENSIONS: [&str; 5] = ["csv", "tsv", "xls", "xlsx", "ods"];

/// Mime types whose content is one record per line.
const TABULAR_MIME_TYPES: [&str; 4] = [
    "text/csv",
    "text/tab-separated-values",
    "application/vnd.ms-excel",
    "application/vnd.oasis.opendocument.spreadsheet",
];

/// How a document's text is split once it exceeds the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPolicy {
    /// Sentence accumulation with word-boundary trimming
    Prose,

    /// Whole-line accumulation for CSV and spreadsheet exports
    Tabular,
}

impl ChunkPolicy {
    /// Pick a policy from a file type hint.
    ///
    /// The hint may be an extension (`csv`, `.xlsx`) or a mime type
    /// (`text/csv`, `application/vnd.openxmlformats-officedocument.spreadsheetml.sheet`).
    /// Missing or unrecognised hints fall back to prose.
    pub fn from_file_type(file_type: Option<&str>) -> Self {
        let Some(file_type) = file_type else {
            return Self::Prose;
        };

        let normalized = file_type.trim().to_ascii_lowercase();
        let extension = normalized.trim_start_matches('.');

        if TABULAR_EXTENSIONS.contains(&extension)
            || TABULAR_MIME_TYPES.contains(&normalized.as_str())
            || normalized.contains("spreadsheet")
            || normalized.contains("excel")
        {
            Self::Tabular
        } else {
            Self::Prose
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Tabular => "tabular",
        }
    }
}

/// File type hint derived from a path's extension.
pub fn file_type_from_path(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
