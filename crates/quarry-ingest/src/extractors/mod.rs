//! Format extractors for the built-in source types.
//!
//! Every extractor reads its source, turns it into [`ParsedDocument`]s or
//! transcript segments, chunks them with the batch settings and replaces the
//! source's chunk rows. None of them writes source status.

mod archive;
mod crawl;
mod file;
mod github;
mod media;
mod rest;
mod sitemap;
mod web;

pub use archive::{documents_from_zip, ZipExtractor};
pub use crawl::CrawlExtractor;
pub use file::{FileExtractor, TextExtractor};
pub use github::{parse_repo, GithubExtractor};
pub use media::{MediaExtractor, MediaKind};
pub use rest::RestExtractor;
pub use sitemap::SitemapExtractor;
pub use web::{Fetcher, WebsiteExtractor};

use crate::chunker::Chunker;
use crate::error::{ExtractError, ExtractResult, IngestResult};
use crate::parsers::{ParsedDocument, PdfParser, DocxParser, CsvParser, TextParser};
use crate::registry::{ExtractionSummary, ExtractorRegistry};
use quarry_config::Config;
use quarry_core::{Chunk, RagSettings, SourceDescriptor, SourceType};
use quarry_db::Database;
use quarry_process::{TranscriptSegment, WhisperOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared handles and limits the extractors work with.
#[derive(Clone)]
pub struct ExtractorContext {
    pub db: Database,
    pub fetcher: Fetcher,
    pub whisper: WhisperOptions,
    pub max_crawl_pages: usize,
    pub max_sitemap_pages: usize,
    pub github_token: Option<String>,
}

impl ExtractorContext {
    pub fn from_config(db: Database, config: &Config) -> IngestResult<Self> {
        Ok(Self {
            db,
            fetcher: Fetcher::new(&config.fetch)?,
            whisper: WhisperOptions {
                model: config.media.whisper_model.clone(),
                language: config.media.language.clone(),
            },
            max_crawl_pages: config.fetch.max_crawl_pages,
            max_sitemap_pages: config.fetch.max_sitemap_pages,
            github_token: config.github.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

/// A registry with an extractor for every built-in source type.
pub fn default_registry(ctx: Arc<ExtractorContext>) -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();

    for source_type in SourceType::ALL {
        let extractor: Arc<dyn crate::registry::Extractor> = match source_type {
            SourceType::Text => Arc::new(TextExtractor::new(ctx.clone())),
            SourceType::Txt => Arc::new(FileExtractor::new(ctx.clone(), &TextParser)),
            SourceType::Pdf => Arc::new(FileExtractor::new(ctx.clone(), &PdfParser)),
            SourceType::Docx => Arc::new(FileExtractor::new(ctx.clone(), &DocxParser)),
            SourceType::Csv => Arc::new(FileExtractor::new(ctx.clone(), &CsvParser)),
            SourceType::Website => Arc::new(WebsiteExtractor::new(ctx.clone())),
            SourceType::Crawl => Arc::new(CrawlExtractor::new(ctx.clone())),
            SourceType::Sitemap => Arc::new(SitemapExtractor::new(ctx.clone())),
            SourceType::Rest => Arc::new(RestExtractor::new(ctx.clone())),
            SourceType::Github => Arc::new(GithubExtractor::new(ctx.clone())),
            SourceType::Zip => Arc::new(ZipExtractor::new(ctx.clone())),
            SourceType::Mp3 => Arc::new(MediaExtractor::new(ctx.clone(), MediaKind::Audio)),
            SourceType::Mp4 => Arc::new(MediaExtractor::new(ctx.clone(), MediaKind::Video)),
            SourceType::Youtube => Arc::new(MediaExtractor::new(ctx.clone(), MediaKind::Youtube)),
        };
        registry.register(source_type.as_str(), extractor);
    }

    registry
}

/// The descriptor's `location`, or a `MissingField` error.
pub(crate) fn required_location(source: &SourceDescriptor) -> ExtractResult<&str> {
    source
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ExtractError::MissingField {
            source_type: source.normalized_type(),
            field: "location",
        })
}

pub(crate) fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Load a file-backed source from disk or over HTTP.
///
/// Returns the file name used for parsing and the raw bytes.
pub(crate) async fn read_location(
    fetcher: &Fetcher,
    location: &str,
) -> ExtractResult<(String, Vec<u8>)> {
    if is_url(location) {
        let name = location
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|n| !n.is_empty())
            .unwrap_or("download")
            .to_string();
        let data = fetcher.get_bytes(location, None).await?;
        return Ok((name, data));
    }

    let path = Path::new(location);
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    Ok((name, tokio::fs::read(path).await?))
}

/// Run CPU-bound or blocking work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> ExtractResult<T>
where
    F: FnOnce() -> ExtractResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}

fn chunk_metadata(source: &SourceDescriptor, doc: &ParsedDocument, hash: &str) -> serde_json::Value {
    let mut metadata = match &doc.metadata {
        serde_json::Value::Object(map) => serde_json::Value::Object(map.clone()),
        _ => serde_json::json!({}),
    };
    metadata["source_type"] = serde_json::json!(source.normalized_type());
    metadata["content_hash"] = serde_json::json!(hash);
    if let Some(title) = &doc.title {
        metadata["title"] = serde_json::json!(title);
    }
    if let Some(kb) = &source.knowledge_base_id {
        metadata["knowledge_base_id"] = serde_json::json!(kb);
    }
    metadata
}

/// Chunk documents with the batch settings and replace the source's chunks.
///
/// Fails with `NoContent` when nothing chunkable was extracted, so a source
/// that silently produced no text is recorded as failed. Chunking and the
/// database write run on the blocking pool.
pub(crate) async fn store_documents(
    db: &Database,
    source: &SourceDescriptor,
    settings: &RagSettings,
    documents: Vec<ParsedDocument>,
) -> ExtractResult<ExtractionSummary> {
    let db = db.clone();
    let source = source.clone();
    let settings = *settings;
    blocking(move || write_documents(&db, &source, &settings, &documents)).await
}

/// Chunk a transcript and replace the source's chunks on the blocking pool.
pub(crate) async fn store_transcript(
    db: &Database,
    source: &SourceDescriptor,
    settings: &RagSettings,
    segments: Vec<TranscriptSegment>,
    metadata: serde_json::Value,
) -> ExtractResult<ExtractionSummary> {
    let db = db.clone();
    let source = source.clone();
    let settings = *settings;
    blocking(move || write_transcript(&db, &source, &settings, &segments, metadata)).await
}

fn write_documents(
    db: &Database,
    source: &SourceDescriptor,
    settings: &RagSettings,
    documents: &[ParsedDocument],
) -> ExtractResult<ExtractionSummary> {
    let chunker = Chunker::from_settings(settings);
    let mut chunks: Vec<Chunk> = Vec::new();

    for doc in documents.iter().filter(|d| !d.is_empty()) {
        let metadata = chunk_metadata(source, doc, &doc.content_hash());
        let first_index = chunks.len() as i32;
        chunks.extend(
            chunker
                .chunk_text(&source.id, &doc.content, first_index)
                .into_iter()
                .map(|c| c.with_metadata(metadata.clone())),
        );
    }

    if chunks.is_empty() {
        return Err(ExtractError::NoContent(source.id.clone()));
    }

    let written = db.replace_source_chunks(&source.id, &chunks)?;
    debug!("Stored {} chunks for source {}", written, source.id);

    Ok(ExtractionSummary {
        documents: documents.len(),
        chunks: written,
    })
}

fn write_transcript(
    db: &Database,
    source: &SourceDescriptor,
    settings: &RagSettings,
    segments: &[TranscriptSegment],
    metadata: serde_json::Value,
) -> ExtractResult<ExtractionSummary> {
    let chunks: Vec<Chunk> = Chunker::from_settings(settings)
        .chunk_transcript(&source.id, segments)
        .into_iter()
        .map(|c| c.with_metadata(metadata.clone()))
        .collect();

    if chunks.is_empty() {
        return Err(ExtractError::NoContent(source.id.clone()));
    }

    let written = db.replace_source_chunks(&source.id, &chunks)?;
    debug!("Stored {} transcript chunks for source {}", written, source.id);

    Ok(ExtractionSummary {
        documents: 1,
        chunks: written,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use quarry_core::Source;

    /// Context over an in-memory database with default limits.
    pub fn context() -> Arc<ExtractorContext> {
        let db = Database::open_in_memory().unwrap();
        db.seed_rag_settings(&RagSettings::default()).unwrap();
        Arc::new(ExtractorContext::from_config(db, &Config::default()).unwrap())
    }

    /// Persist `source` so chunk rows can reference it, and stamp it.
    pub fn register(ctx: &ExtractorContext, mut source: SourceDescriptor) -> SourceDescriptor {
        ctx.db.create_source(&Source::new(source.clone())).unwrap();
        source.stamp(&RagSettings::default());
        source
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{context, register};
    use super::*;
    use crate::dispatcher::Dispatcher;
    use quarry_core::{Source, SourceStatus};

    #[test]
    fn test_default_registry_covers_every_type() {
        let registry = default_registry(context());
        assert_eq!(registry.len(), SourceType::ALL.len());
        for source_type in SourceType::ALL {
            assert!(registry.contains(source_type.as_str()), "{}", source_type);
        }
    }

    #[tokio::test]
    async fn test_store_documents_replaces_chunks() {
        let ctx = context();
        let source = register(&ctx, SourceDescriptor::new("s1", "text").with_knowledge_base("kb"));

        let docs = vec![
            ParsedDocument::new("first document").with_title("One"),
            ParsedDocument::new("   "),
            ParsedDocument::new("second document"),
        ];
        let summary = store_documents(&ctx.db, &source, &RagSettings::default(), docs.clone())
            .await
            .unwrap();
        assert_eq!(summary.chunks, 2);

        let stored = ctx.db.get_chunks_by_source("s1").unwrap();
        assert_eq!(stored[0].chunk_index, 0);
        assert_eq!(stored[1].chunk_index, 1);
        assert_eq!(stored[0].metadata["title"], "One");
        assert_eq!(stored[0].metadata["knowledge_base_id"], "kb");
        assert_eq!(stored[0].metadata["source_type"], "text");

        store_documents(&ctx.db, &source, &RagSettings::default(), docs[..1].to_vec())
            .await
            .unwrap();
        assert_eq!(ctx.db.count_chunks_by_source("s1").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_extraction_is_an_error() {
        let ctx = context();
        let source = register(&ctx, SourceDescriptor::new("s1", "text"));

        let err = store_documents(&ctx.db, &source, &RagSettings::default(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoContent(_)));
    }

    #[tokio::test]
    async fn test_store_transcript_carries_metadata() {
        let ctx = context();
        let source = register(&ctx, SourceDescriptor::new("m1", "audio"));
        let segments = vec![
            TranscriptSegment {
                text: "hello there".into(),
                start: 0.0,
                end: 2.5,
            },
            TranscriptSegment {
                text: "general remarks".into(),
                start: 2.5,
                end: 5.0,
            },
        ];

        let summary = store_transcript(
            &ctx.db,
            &source,
            &RagSettings::default(),
            segments,
            serde_json::json!({ "format": "transcript" }),
        )
        .await
        .unwrap();

        assert_eq!(summary.documents, 1);
        let stored = ctx.db.get_chunks_by_source("m1").unwrap();
        assert_eq!(stored.len(), summary.chunks);
        assert_eq!(stored[0].metadata["format"], "transcript");
    }

    #[tokio::test]
    async fn test_read_location_missing_file() {
        let ctx = context();
        let err = read_location(&ctx.fetcher, "/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_batch_through_default_registry() {
        let ctx = context();
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "Notes kept on disk.\n\nA second paragraph.").unwrap();

        let batch = vec![
            SourceDescriptor::new("inline", "TEXT").with_content("Inline text source."),
            SourceDescriptor::new("file", "txt").with_location(notes.to_string_lossy()),
            SourceDescriptor::new("missing", "pdf").with_location("/nope/missing.pdf"),
            SourceDescriptor::new("empty", "text"),
        ];
        for source in &batch {
            ctx.db.create_source(&Source::new(source.clone())).unwrap();
        }

        let dispatcher = Dispatcher::new(default_registry(ctx.clone()));
        dispatcher.dispatch(&ctx.db, batch).await.unwrap();

        let status = |id: &str| ctx.db.get_source(id).unwrap().status;
        assert_eq!(status("inline"), SourceStatus::Finished);
        assert_eq!(status("file"), SourceStatus::Finished);
        assert_eq!(status("missing"), SourceStatus::Failed);
        assert_eq!(status("empty"), SourceStatus::Failed);

        assert_eq!(ctx.db.count_chunks_by_source("inline").unwrap(), 1);
        assert_eq!(ctx.db.count_chunks_by_source("file").unwrap(), 1);

        let missing = ctx.db.get_source("missing").unwrap();
        assert!(missing.error.unwrap().contains("not found"));
        assert_eq!(ctx.db.status_counts().unwrap().failed, 2);
    }
}
