//! Quarry Ingest - Batch ingestion of external sources into chunked text.
//!
//! This crate provides:
//! - The batch dispatcher, with per-source failure isolation
//! - The status tracker that owns source status writes
//! - The extractor registry and one extractor per built-in source type
//! - Document parsing (PDF, DOCX, CSV, markdown, HTML, text and code)
//! - Content chunking sized by the shared ingestion settings

mod chunker;
mod dispatcher;
mod error;
pub mod extractors;
pub mod parsers;
mod registry;
mod settings;
mod store;
mod tracker;

#[cfg(test)]
mod testing;

pub use chunker::{ChunkConfig, Chunker};
pub use dispatcher::Dispatcher;
pub use error::{ExtractError, ExtractResult, IngestError, IngestResult, TrackerError};
pub use extractors::{default_registry, ExtractorContext};
pub use registry::{DispatchOutcome, ExtractionSummary, Extractor, ExtractorRegistry};
pub use settings::resolve_settings;
pub use store::SourceStore;
pub use tracker::StatusTracker;
