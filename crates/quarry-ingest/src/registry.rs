//! Mapping from source type tags to extractors.

use crate::error::ExtractResult;
use async_trait::async_trait;
use quarry_core::{normalize_type, RagSettings, SourceDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// What an extractor produced for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Number of documents (pages, files, rows, recordings) read.
    pub documents: usize,
    /// Number of chunks written.
    pub chunks: usize,
}

/// Result of dispatching one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An extractor ran and succeeded.
    Extracted(ExtractionSummary),
    /// No extractor is registered for the descriptor's type.
    Skipped,
}

/// Reads one kind of source and stores its chunks.
///
/// Extractors receive a descriptor already stamped with the batch settings;
/// `settings` is the same snapshot, passed so implementations do not have to
/// unwrap the optional fields.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary>;
}

/// Type tag to extractor lookup.
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor for a tag, replacing any previous one.
    pub fn register(&mut self, tag: &str, extractor: Arc<dyn Extractor>) -> &mut Self {
        self.extractors.insert(normalize_type(tag), extractor);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn Extractor>> {
        self.extractors.get(&normalize_type(tag))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run the extractor registered for the descriptor's type.
    ///
    /// An unregistered type is not an error: it yields
    /// [`DispatchOutcome::Skipped`] without invoking anything.
    pub async fn dispatch(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<DispatchOutcome> {
        match self.get(&source.source_type) {
            Some(extractor) => extractor
                .extract(source, settings)
                .await
                .map(DispatchOutcome::Extracted),
            None => {
                warn!(
                    "No extractor registered for type '{}' (source {})",
                    source.source_type, source.id
                );
                Ok(DispatchOutcome::Skipped)
            }
        }
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
