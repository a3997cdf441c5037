//! Test doubles shared by the unit tests in this crate.

use crate::error::{ExtractError, ExtractResult};
use crate::registry::{ExtractionSummary, Extractor};
use crate::store::SourceStore;
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor, SourceStatus, StatusUpdate};
use quarry_db::{DbError, DbResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory store that records every status write.
pub struct RecordingStore {
    settings: Option<RagSettings>,
    failing: HashSet<String>,
    loads: AtomicUsize,
    writes: Mutex<Vec<(String, StatusUpdate)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            settings: Some(RagSettings::default()),
            failing: HashSet::new(),
            loads: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_settings(mut self, settings: RagSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn without_settings(mut self) -> Self {
        self.settings = None;
        self
    }

    /// Status writes for `id` fail as if the row had been deleted.
    pub fn failing_writes_for(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(String, StatusUpdate)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn statuses_for(&self, id: &str) -> Vec<SourceStatus> {
        self.writes()
            .into_iter()
            .filter(|(written, _)| written == id)
            .map(|(_, update)| update.status)
            .collect()
    }
}

impl SourceStore for RecordingStore {
    fn load_rag_settings(&self) -> DbResult<RagSettings> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.settings
            .ok_or_else(|| DbError::NotFound("RAG settings".to_string()))
    }

    fn update_source_status(&self, id: &str, update: &StatusUpdate) -> DbResult<()> {
        if self.failing.contains(id) {
            return Err(DbError::NotFound(format!("Source not found: {}", id)));
        }
        self.writes
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));
        Ok(())
    }
}

enum Behavior {
    Succeed(usize),
    Fail(String),
    Hang,
}

/// Extractor that counts calls and records the descriptors it was given.
pub struct CountingExtractor {
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<SourceDescriptor>>,
}

impl CountingExtractor {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(chunks: usize) -> Self {
        Self::with_behavior(Behavior::Succeed(chunks))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Fail(message.to_string()))
    }

    /// Never completes.
    pub fn hanging() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SourceDescriptor> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for CountingExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        _settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(source.clone());

        match &self.behavior {
            Behavior::Succeed(chunks) => Ok(ExtractionSummary {
                documents: 1,
                chunks: *chunks,
            }),
            Behavior::Fail(message) => Err(ExtractError::parse(&source.source_type, message)),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(ExtractionSummary::default())
            }
        }
    }
}
