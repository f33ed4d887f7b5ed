//! Source file parsing and text extraction.

use docsift_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Tabular,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("md" | "markdown") => Self::Markdown,
            Some("html" | "htm") => Self::Html,
            Some("csv" | "tsv") => Self::Tabular,
            Some("txt" | "text" | "rst" | "log") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Tabular => "tabular",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Read a source file and extract clean text.
///
/// Binary files (anything that is not UTF-8 or contains NUL bytes) are
/// rejected with `InvalidInput`.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let raw = String::from_utf8(bytes)
        .map_err(|_| AppError::InvalidInput(format!("Not a UTF-8 text file: {:?}", path)))?;
    if raw.contains('\0') {
        return Err(AppError::InvalidInput(format!(
            "Binary file not supported: {:?}",
            path
        )));
    }

    Ok(match ContentType::from_path(path) {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        ContentType::Tabular => clean_tabular(&raw),
        ContentType::PlainText | ContentType::Unknown => raw,
    })
}

/// Strip heading markers, rules and code fences; keep the prose.
fn clean_markdown(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_start_matches('#').trim())
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("---")
                && !line.starts_with("```")
                && !line.starts_with("~~~")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip tags along with script and style bodies, then collapse whitespace.
fn clean_html(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut skip_until: Option<&str> = None;

    for (i, ch) in text.char_indices() {
        if let Some(closing) = skip_until {
            if lower[i..].starts_with(closing) {
                skip_until = None;
                in_tag = true;
            }
            continue;
        }

        match ch {
            '<' => {
                in_tag = true;
                if lower[i..].starts_with("<script") {
                    skip_until = Some("</script");
                } else if lower[i..].starts_with("<style") {
                    skip_until = Some("</style");
                }
            }
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop blank rows; rows themselves are kept verbatim.
fn clean_tabular(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("file.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("DATA.CSV")),
            ContentType::Tabular
        );
        assert_eq!(
            ContentType::from_path(Path::new("file.txt")),
            ContentType::PlainText
        );
        assert_eq!(
            ContentType::from_path(Path::new("Makefile")),
            ContentType::Unknown
        );
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><body><p>Hello <b>world</b></p></body></html>";
        assert_eq!(clean_html(input), "Hello world");
    }

    #[test]
    fn test_clean_html_skips_scripts_and_handles_utf8() {
        let input = "<p>Olá</p><script>var x = '<p>';</script><style>p{}</style><p>mundo é</p>";
        assert_eq!(clean_html(input), "Olá mundo é");
    }

    #[test]
    fn test_clean_tabular() {
        assert_eq!(clean_tabular("a,b  \n\n1,2\n"), "a,b\n1,2");
    }

    #[test]
    fn test_parse_file_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        std::fs::write(&path, [0u8, 159, 146, 150]).unwrap();

        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_file_markdown() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        std::fs::write(&path, "# Title\n\nBody text.\n").unwrap();

        assert_eq!(parse_file(&path).unwrap(), "Title\nBody text.");
    }
}
