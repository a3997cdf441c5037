//! `zip` sources and the archive reader shared with GitHub ingestion.

use super::{blocking, read_location, required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::parsers::{looks_binary, parser_for, DocumentParser, DocxParser, ParsedDocument, PdfParser};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use std::io::{Cursor, Read};
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entries larger than this are skipped.
const MAX_ENTRY_BYTES: u64 = 20 * 1024 * 1024;

/// Directories that never hold content worth indexing.
const SKIPPED_DIRS: [&str; 5] = ["node_modules", "target", "vendor", "dist", "__pycache__"];

fn skip_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part.starts_with('.') || SKIPPED_DIRS.contains(&part.as_ref())
        }
        _ => false,
    })
}

fn is_binary_format(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PdfParser.supports(e) || DocxParser.supports(e))
        .unwrap_or(false)
}

/// Parse every supported entry of a zip archive into a document.
///
/// With `strip_root` the first path component is dropped, as GitHub archives
/// wrap the tree in an `owner-repo-sha/` directory. Hidden paths, binary
/// entries and formats without a parser are skipped; an entry that fails to
/// parse is logged and skipped.
pub fn documents_from_zip(data: &[u8], strip_root: bool) -> ExtractResult<Vec<ParsedDocument>> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| ExtractError::parse("zip archive", e))?;

    let mut documents = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ExtractError::parse("zip archive", e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(full_path) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive path {}", entry.name());
            continue;
        };
        let path = if strip_root {
            full_path.components().skip(1).collect()
        } else {
            full_path
        };
        let name = path.to_string_lossy().to_string();
        if name.is_empty() || skip_path(&path) {
            continue;
        }
        let Some(parser) = parser_for(&name) else {
            debug!("No parser for {}", name);
            continue;
        };
        if entry.size() > MAX_ENTRY_BYTES {
            warn!("Skipping {} ({} bytes)", name, entry.size());
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        if !is_binary_format(&path) && looks_binary(&bytes) {
            continue;
        }

        match parser.parse_bytes(&name, &bytes) {
            Ok(doc) if !doc.is_empty() => {
                let mut doc = match doc.title {
                    Some(_) => doc,
                    None => doc.with_title(name.clone()),
                };
                doc.metadata["path"] = serde_json::json!(name);
                documents.push(doc);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", name, e),
        }
    }

    Ok(documents)
}

/// Reads the archive at `location` (path or URL).
pub struct ZipExtractor {
    ctx: Arc<ExtractorContext>,
}

impl ZipExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Extractor for ZipExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let location = required_location(source)?;
        let (name, data) = read_location(&self.ctx.fetcher, location).await?;

        let documents = blocking(move || documents_from_zip(&data, false)).await?;
        info!("Read {} documents from {}", documents.len(), name);

        store_documents(&self.ctx.db, source, settings, documents).await
    }
}
