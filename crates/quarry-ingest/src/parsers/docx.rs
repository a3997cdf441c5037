//! Word document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{ExtractError, ExtractResult};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

/// Parser for `.docx` files. Paragraph text only; tables and images are
/// skipped.
pub struct DocxParser;

impl DocumentParser for DocxParser {
    fn parse_bytes(&self, name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        let docx = docx_rs::read_docx(data).map_err(|e| ExtractError::parse(name, e))?;

        let mut paragraphs = Vec::new();
        for child in docx.document.children {
            if let DocumentChild::Paragraph(p) = child {
                let mut line = String::new();
                for child in p.children {
                    if let ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let RunChild::Text(t) = child {
                                line.push_str(&t.text);
                            }
                        }
                    }
                }
                if !line.trim().is_empty() {
                    paragraphs.push(line);
                }
            }
        }

        debug!("Read {} paragraphs from {}", paragraphs.len(), name);

        Ok(ParsedDocument::new(paragraphs.join("\n\n")).with_metadata(serde_json::json!({
            "format": "docx",
            "paragraphs": paragraphs.len(),
        })))
    }

    fn extensions(&self) -> &[&str] {
        &["docx"]
    }
}
