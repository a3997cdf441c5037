//! Core domain types for Quarry.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for sources.
pub type SourceId = String;

/// Unique identifier for chunks.
pub type ChunkId = String;

/// Identifier of the knowledge base a source is attached to.
pub type KnowledgeBaseId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of content a source points at.
///
/// Descriptors carry their type as a raw string so that tags registered at
/// runtime keep working; this enum names the tags shipped with Quarry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Website,
    Text,
    Pdf,
    Crawl,
    Docx,
    Csv,
    Github,
    Txt,
    Mp3,
    Mp4,
    Youtube,
    Rest,
    Sitemap,
    Zip,
}

impl SourceType {
    /// Every built-in source type.
    pub const ALL: [SourceType; 14] = [
        SourceType::Website,
        SourceType::Text,
        SourceType::Pdf,
        SourceType::Crawl,
        SourceType::Docx,
        SourceType::Csv,
        SourceType::Github,
        SourceType::Txt,
        SourceType::Mp3,
        SourceType::Mp4,
        SourceType::Youtube,
        SourceType::Rest,
        SourceType::Sitemap,
        SourceType::Zip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Website => "website",
            SourceType::Text => "text",
            SourceType::Pdf => "pdf",
            SourceType::Crawl => "crawl",
            SourceType::Docx => "docx",
            SourceType::Csv => "csv",
            SourceType::Github => "github",
            SourceType::Txt => "txt",
            SourceType::Mp3 => "mp3",
            SourceType::Mp4 => "mp4",
            SourceType::Youtube => "youtube",
            SourceType::Rest => "rest",
            SourceType::Sitemap => "sitemap",
            SourceType::Zip => "zip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = normalize_type(s);
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a raw type tag for registry lookup.
pub fn normalize_type(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Lifecycle status of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceStatus {
    #[default]
    Pending,
    Processing,
    Finished,
    Failed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Pending => "PENDING",
            SourceStatus::Processing => "PROCESSING",
            SourceStatus::Finished => "FINISHED",
            SourceStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(SourceStatus::Pending),
            "PROCESSING" => Some(SourceStatus::Processing),
            "FINISHED" => Some(SourceStatus::Finished),
            "FAILED" => Some(SourceStatus::Failed),
            _ => None,
        }
    }

    /// `FINISHED` and `FAILED` end an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceStatus::Finished | SourceStatus::Failed)
    }

    /// Whether a status write may move a source from `self` to `next`.
    ///
    /// `PROCESSING` is reachable from every state: terminal sources may be
    /// picked up again by a later batch, and a source left `PROCESSING` by an
    /// interrupted batch is restarted. A terminal status is only reachable
    /// from `PROCESSING`.
    pub fn can_transition_to(&self, next: SourceStatus) -> bool {
        match next {
            SourceStatus::Processing => true,
            SourceStatus::Finished | SourceStatus::Failed => *self == SourceStatus::Processing,
            SourceStatus::Pending => false,
        }
    }

    /// Check a transition, returning an error describing it when invalid.
    pub fn transition(&self, next: SourceStatus) -> Result<SourceStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tenant-wide ingestion settings, resolved once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSettings {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Render pages with a headless browser instead of a plain HTTP fetch.
    #[serde(alias = "usePuppeteerFetch")]
    pub use_headless_fetch: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            use_headless_fetch: false,
        }
    }
}

impl RagSettings {
    pub fn new(chunk_size: usize, chunk_overlap: usize, use_headless_fetch: bool) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            use_headless_fetch,
        }
    }

    /// Reject settings the chunker cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidSettings(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidSettings(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// One unit of ingestion work.
///
/// The chunking fields are owned by the batch, not the descriptor: whatever a
/// descriptor arrives with is overwritten by [`SourceDescriptor::stamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: SourceId,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, alias = "botId")]
    pub knowledge_base_id: Option<KnowledgeBaseId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
    #[serde(default, alias = "usePuppeteerFetch")]
    pub use_headless_fetch: Option<bool>,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<SourceId>, source_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_type: source_type.into(),
            knowledge_base_id: None,
            content: None,
            location: None,
            options: serde_json::Value::Null,
            chunk_size: None,
            chunk_overlap: None,
            use_headless_fetch: None,
        }
    }

    pub fn with_knowledge_base(mut self, kb: impl Into<KnowledgeBaseId>) -> Self {
        self.knowledge_base_id = Some(kb.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// The type tag as used for registry lookup.
    pub fn normalized_type(&self) -> String {
        normalize_type(&self.source_type)
    }

    /// The built-in type, if the tag names one.
    pub fn known_type(&self) -> Option<SourceType> {
        SourceType::from_str(&self.source_type)
    }

    /// Overwrite chunking parameters with the batch settings.
    pub fn stamp(&mut self, settings: &RagSettings) {
        self.chunk_size = Some(settings.chunk_size);
        self.chunk_overlap = Some(settings.chunk_overlap);
        self.use_headless_fetch = Some(settings.use_headless_fetch);
    }

    /// Settings carried by a stamped descriptor.
    pub fn stamped_settings(&self) -> Option<RagSettings> {
        Some(RagSettings {
            chunk_size: self.chunk_size?,
            chunk_overlap: self.chunk_overlap?,
            use_headless_fetch: self.use_headless_fetch?,
        })
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(|v| v.as_u64())
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }
}

/// A source as persisted, with its lifecycle fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub descriptor: SourceDescriptor,
    pub status: SourceStatus,
    pub is_pending: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        let now = Utc::now();
        Self {
            descriptor,
            status: SourceStatus::Pending,
            is_pending: true,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

/// A status write for one source.
///
/// Terminal updates always clear `is_pending` in the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: SourceStatus,
    pub error: Option<String>,
}

impl StatusUpdate {
    pub fn processing() -> Self {
        Self {
            status: SourceStatus::Processing,
            error: None,
        }
    }

    pub fn finished() -> Self {
        Self {
            status: SourceStatus::Finished,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: SourceStatus::Failed,
            error: Some(error.into()),
        }
    }

    /// The `is_pending` value written alongside this status, if any.
    pub fn pending_flag(&self) -> Option<bool> {
        if self.status.is_terminal() {
            Some(false)
        } else {
            None
        }
    }
}

/// A chunk of extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source_id: SourceId,
    pub chunk_index: i32,
    pub content: String,
    pub metadata: serde_json::Value,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

impl Chunk {
    pub fn new(source_id: SourceId, chunk_index: i32, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            source_id,
            chunk_index,
            content: content.into(),
            metadata: serde_json::json!({}),
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamps(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }
}

/// Number of sources in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub processing: i64,
    pub finished: i64,
    pub failed: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.finished + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_is_case_insensitive() {
        assert_eq!(SourceType::from_str("PDF"), Some(SourceType::Pdf));
        assert_eq!(SourceType::from_str(" YouTube "), Some(SourceType::Youtube));
        assert_eq!(SourceType::from_str("bogus"), None);
    }

    #[test]
    fn test_status_transitions() {
        use SourceStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Finished));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));

        assert!(Processing.can_transition_to(Processing));

        assert!(!Pending.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
        assert!(Pending.transition(Failed).is_err());
    }

    #[test]
    fn test_terminal_update_clears_pending() {
        assert_eq!(StatusUpdate::processing().pending_flag(), None);
        assert_eq!(StatusUpdate::finished().pending_flag(), Some(false));
        assert_eq!(StatusUpdate::failed("boom").pending_flag(), Some(false));
    }

    #[test]
    fn test_stamp_overrides_local_values() {
        let mut source = SourceDescriptor::new("a", "pdf");
        source.chunk_size = Some(42);
        source.use_headless_fetch = Some(true);

        source.stamp(&RagSettings::new(500, 50, false));

        assert_eq!(source.stamped_settings(), Some(RagSettings::new(500, 50, false)));
    }

    #[test]
    fn test_settings_validation() {
        assert!(RagSettings::default().validate().is_ok());
        assert!(RagSettings::new(0, 0, false).validate().is_err());
        assert!(RagSettings::new(100, 100, false).validate().is_err());
    }

    #[test]
    fn test_descriptor_accepts_wire_names() {
        let json = r#"{
            "id": "src-1",
            "type": "Website",
            "botId": "kb-1",
            "location": "https://example.com",
            "chunkSize": 10,
            "usePuppeteerFetch": true
        }"#;

        let source: SourceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(source.normalized_type(), "website");
        assert_eq!(source.knowledge_base_id.as_deref(), Some("kb-1"));
        assert_eq!(source.chunk_size, Some(10));
        assert_eq!(source.use_headless_fetch, Some(true));
        assert_eq!(source.known_type(), Some(SourceType::Website));
    }
}
