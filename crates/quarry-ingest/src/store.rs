//! The persistence seam between the dispatcher and the database.

use quarry_core::{RagSettings, StatusUpdate};
use quarry_db::{Database, DbResult};

/// What the dispatcher needs from persistence.
///
/// The dispatcher reads settings once per batch and writes source status;
/// chunk rows are written by extractors through their own handle.
pub trait SourceStore: Send + Sync {
    /// Read the tenant-wide ingestion settings.
    fn load_rag_settings(&self) -> DbResult<RagSettings>;

    /// Write one status for one source, keyed by id.
    fn update_source_status(&self, id: &str, update: &StatusUpdate) -> DbResult<()>;
}

impl SourceStore for Database {
    fn load_rag_settings(&self) -> DbResult<RagSettings> {
        self.get_rag_settings()
    }

    fn update_source_status(&self, id: &str, update: &StatusUpdate) -> DbResult<()> {
        Database::update_source_status(self, id, update)
    }
}
