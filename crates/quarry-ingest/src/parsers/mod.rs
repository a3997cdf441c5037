//! Document parsers for the file formats sources can point at.

mod csv;
mod docx;
mod html;
mod markdown;
mod pdf;
pub mod sitemap;
mod text;

pub use self::csv::CsvParser;
pub use docx::DocxParser;
pub use html::{extract_links, html_to_text, HtmlParser};
pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::error::{ExtractError, ExtractResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parsed document content.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The main text content.
    pub content: String,
    /// Document title (if extracted).
    pub title: Option<String>,
    /// Extracted metadata.
    pub metadata: serde_json::Value,
}

impl ParsedDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// SHA-256 of the extracted text, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Trait for document parsers.
pub trait DocumentParser: Send + Sync {
    /// Parse an in-memory document. `name` is used for titles and errors.
    fn parse_bytes(&self, name: &str, data: &[u8]) -> ExtractResult<ParsedDocument>;

    /// File extensions handled by this parser.
    fn extensions(&self) -> &[&str];

    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Read and parse a file, titling it after the file stem when the format
    /// carries no title of its own.
    fn parse_file(&self, path: &Path) -> ExtractResult<ParsedDocument> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");

        let doc = self.parse_bytes(name, &data)?;
        if doc.title.is_some() {
            return Ok(doc);
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => Ok(doc.with_title(stem)),
            None => Ok(doc),
        }
    }
}

static PARSERS: [&dyn DocumentParser; 6] = [
    &PdfParser,
    &DocxParser,
    &CsvParser,
    &MarkdownParser,
    &HtmlParser,
    &TextParser,
];

/// The parser for a file name, chosen by extension.
pub fn parser_for(name: &str) -> Option<&'static dyn DocumentParser> {
    let extension = Path::new(name).extension()?.to_str()?;
    PARSERS.iter().copied().find(|p| p.supports(extension))
}

/// Heuristic used to skip binary archive entries: a NUL byte near the start.
pub fn looks_binary(data: &[u8]) -> bool {
    data.iter().take(8000).any(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_extension() {
        assert!(parser_for("report.PDF").is_some());
        assert!(parser_for("notes/readme.md").is_some());
        assert!(parser_for("src/main.rs").is_some());
        assert!(parser_for("image.png").is_none());
        assert!(parser_for("Makefile").is_none());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = ParsedDocument::new("same text");
        let b = ParsedDocument::new("same text").with_title("other");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
        assert_ne!(a.content_hash(), ParsedDocument::new("different").content_hash());
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(&[0x89, b'P', b'N', b'G', 0, 0]));
        assert!(!looks_binary(b"plain text"));
    }

    #[test]
    fn test_parse_file_titles_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let doc = TextParser.parse_file(&path).unwrap();
        assert_eq!(doc.title.as_deref(), Some("notes"));

        let err = TextParser.parse_file(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }
}
