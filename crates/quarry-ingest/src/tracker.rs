//! Source status transitions for one batch.

use crate::error::TrackerError;
use crate::store::SourceStore;
use quarry_core::{SourceId, StatusUpdate};
use std::collections::HashSet;
use tracing::debug;

/// Writes the `PROCESSING` and terminal statuses of each source in a batch.
///
/// One tracker lives for one batch. It allows a single attempt per source id
/// and a single attempt in flight at a time, so every id sees at most one
/// `PROCESSING` write followed by at most one terminal write.
pub struct StatusTracker<'a, S: SourceStore + ?Sized> {
    store: &'a S,
    attempted: HashSet<SourceId>,
    in_flight: Option<SourceId>,
}

impl<'a, S: SourceStore + ?Sized> StatusTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            attempted: HashSet::new(),
            in_flight: None,
        }
    }

    /// Open an attempt for `id` and write `PROCESSING`.
    ///
    /// When the write itself fails the attempt stays open, so the caller can
    /// still record `FAILED`.
    pub fn mark_processing(&mut self, id: &str) -> Result<(), TrackerError> {
        if let Some(active) = &self.in_flight {
            return Err(TrackerError::AttemptInFlight {
                id: id.to_string(),
                active: active.clone(),
            });
        }
        if !self.attempted.insert(id.to_string()) {
            return Err(TrackerError::DuplicateAttempt(id.to_string()));
        }

        self.in_flight = Some(id.to_string());
        self.write(id, StatusUpdate::processing())
    }

    /// Close the attempt for `id` with `FINISHED`.
    pub fn mark_finished(&mut self, id: &str) -> Result<(), TrackerError> {
        self.close(id, StatusUpdate::finished())
    }

    /// Close the attempt for `id` with `FAILED`, recording `reason`.
    pub fn mark_failed(&mut self, id: &str, reason: &str) -> Result<(), TrackerError> {
        self.close(id, StatusUpdate::failed(reason))
    }

    /// Id of the attempt currently open, if any.
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    fn close(&mut self, id: &str, update: StatusUpdate) -> Result<(), TrackerError> {
        if self.in_flight.as_deref() != Some(id) {
            return Err(TrackerError::NotInFlight(id.to_string()));
        }
        // The attempt is over even if the terminal write fails.
        self.in_flight = None;
        self.write(id, update)
    }

    fn write(&self, id: &str, update: StatusUpdate) -> Result<(), TrackerError> {
        debug!("Marking source {} as {}", id, update.status);
        self.store
            .update_source_status(id, &update)
            .map_err(|source| TrackerError::Write {
                id: id.to_string(),
                status: update.status,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStore;
    use quarry_core::SourceStatus;

    #[test]
    fn test_happy_path_writes() {
        let store = RecordingStore::new();
        let mut tracker = StatusTracker::new(&store);

        tracker.mark_processing("a").unwrap();
        assert_eq!(tracker.in_flight(), Some("a"));
        tracker.mark_finished("a").unwrap();
        assert_eq!(tracker.in_flight(), None);

        assert_eq!(
            store.statuses_for("a"),
            vec![SourceStatus::Processing, SourceStatus::Finished]
        );
    }

    #[test]
    fn test_terminal_write_happens_once() {
        let store = RecordingStore::new();
        let mut tracker = StatusTracker::new(&store);

        tracker.mark_processing("a").unwrap();
        tracker.mark_failed("a", "boom").unwrap();

        let err = tracker.mark_finished("a").unwrap_err();
        assert!(matches!(err, TrackerError::NotInFlight(_)));
        assert_eq!(store.writes().len(), 2);
    }

    #[test]
    fn test_terminal_requires_processing() {
        let store = RecordingStore::new();
        let mut tracker = StatusTracker::new(&store);

        assert!(matches!(
            tracker.mark_finished("a"),
            Err(TrackerError::NotInFlight(_))
        ));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_rejects_overlapping_attempts() {
        let store = RecordingStore::new();
        let mut tracker = StatusTracker::new(&store);

        tracker.mark_processing("a").unwrap();
        let err = tracker.mark_processing("b").unwrap_err();
        assert!(matches!(err, TrackerError::AttemptInFlight { .. }));

        tracker.mark_finished("a").unwrap();
        let err = tracker.mark_processing("a").unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateAttempt(_)));

        assert_eq!(store.statuses_for("a").len(), 2);
        assert!(store.statuses_for("b").is_empty());
    }

    #[test]
    fn test_failed_processing_write_keeps_attempt_open() {
        let store = RecordingStore::new().failing_writes_for("gone");
        let mut tracker = StatusTracker::new(&store);

        let err = tracker.mark_processing("gone").unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Write {
                status: SourceStatus::Processing,
                ..
            }
        ));
        assert_eq!(tracker.in_flight(), Some("gone"));

        assert!(tracker.mark_failed("gone", "deleted").is_err());
        assert_eq!(tracker.in_flight(), None);
    }
}
