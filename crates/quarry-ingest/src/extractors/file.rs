//! Inline text and single-file sources (txt, pdf, docx, csv).

use super::{blocking, read_location, required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::parsers::{DocumentParser, ParsedDocument};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use std::sync::Arc;
use tracing::info;

/// `text` sources: the content travels inside the descriptor.
pub struct TextExtractor {
    ctx: Arc<ExtractorContext>,
}

impl TextExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let content = source
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ExtractError::MissingField {
                source_type: source.normalized_type(),
                field: "content",
            })?;

        let mut doc = ParsedDocument::new(content)
            .with_metadata(serde_json::json!({ "format": "text" }));
        if let Some(title) = source.option_str("title") {
            doc = doc.with_title(title);
        }

        store_documents(&self.ctx.db, source, settings, vec![doc]).await
    }
}

/// File sources parsed by a single [`DocumentParser`].
///
/// `location` is a local path or an http(s) URL.
pub struct FileExtractor {
    ctx: Arc<ExtractorContext>,
    parser: &'static dyn DocumentParser,
}

impl FileExtractor {
    pub fn new(ctx: Arc<ExtractorContext>, parser: &'static dyn DocumentParser) -> Self {
        Self { ctx, parser }
    }
}

#[async_trait]
impl Extractor for FileExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let location = required_location(source)?;
        let (name, data) = read_location(&self.ctx.fetcher, location).await?;

        info!("Parsing {} ({} bytes) for source {}", name, data.len(), source.id);

        let parser = self.parser;
        let parse_name = name.clone();
        let doc = blocking(move || parser.parse_bytes(&parse_name, &data)).await?;

        let title_stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&name);
        let mut doc = match doc.title {
            Some(_) => doc,
            None => doc.with_title(title_stem),
        };
        doc.metadata["location"] = serde_json::json!(location);

        store_documents(&self.ctx.db, source, settings, vec![doc]).await
    }
}
