//! Per-batch resolution of the shared ingestion settings.

use crate::error::{IngestError, IngestResult};
use crate::store::SourceStore;
use quarry_core::RagSettings;
use tracing::debug;

/// Load and validate the settings every descriptor in a batch is stamped with.
///
/// Any failure here is batch-fatal: the caller must not touch a single
/// descriptor without a valid snapshot.
pub fn resolve_settings<S: SourceStore + ?Sized>(store: &S) -> IngestResult<RagSettings> {
    let settings = store.load_rag_settings().map_err(IngestError::Settings)?;
    settings.validate()?;

    debug!(
        "Resolved ingestion settings: chunk_size={}, chunk_overlap={}, headless_fetch={}",
        settings.chunk_size, settings.chunk_overlap, settings.use_headless_fetch
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_db::Database;

    #[test]
    fn test_resolves_seeded_settings() {
        let db = Database::open_in_memory().unwrap();
        db.seed_rag_settings(&RagSettings::new(750, 75, true)).unwrap();

        let settings = resolve_settings(&db).unwrap();
        assert_eq!(settings, RagSettings::new(750, 75, true));
    }

    #[test]
    fn test_missing_settings_is_fatal() {
        let db = Database::open_in_memory().unwrap();
        let err = resolve_settings(&db).unwrap_err();
        assert!(matches!(err, IngestError::Settings(_)));
    }

    #[test]
    fn test_invalid_settings_are_fatal() {
        let db = Database::open_in_memory().unwrap();
        db.set_rag_settings(&RagSettings::new(100, 100, false)).unwrap();

        let err = resolve_settings(&db).unwrap_err();
        assert!(matches!(err, IngestError::InvalidSettings(_)));
    }
}
