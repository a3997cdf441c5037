//! PDF document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{ExtractError, ExtractResult};
use tracing::debug;

/// Parser for PDF files.
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn parse_bytes(&self, name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        debug!("Parsing PDF: {}", name);

        let raw = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ExtractError::parse(name, format!("failed to extract text from PDF: {}", e)))?;

        let page_count = raw.matches('\x0C').count().max(1);
        let content = clean_pdf_text(&raw);

        debug!("Extracted {} characters from {}", content.len(), name);

        Ok(ParsedDocument::new(content).with_metadata(serde_json::json!({
            "format": "pdf",
            "pages": page_count,
        })))
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Trim lines, collapse runs of blank lines and turn page breaks into
/// paragraph breaks.
fn clean_pdf_text(text: &str) -> String {
    text.replace('\x0C', "\n\n")
        .lines()
        .map(str::trim)
        .fold(Vec::new(), |mut acc: Vec<&str>, line| {
            let last_was_empty = acc.last().map(|s| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_pdf_text() {
        let cleaned = clean_pdf_text("  Hello  \n\n\n\nWorld  \x0CNext page\n\nTest");
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.starts_with("Hello\n\nWorld"));
        assert!(cleaned.contains("World\n\nNext page"));
    }

    #[test]
    fn test_pdf_parser_extensions() {
        assert!(PdfParser.supports("pdf"));
        assert!(PdfParser.supports("PDF"));
        assert!(!PdfParser.supports("txt"));
    }
}
