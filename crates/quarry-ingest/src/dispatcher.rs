//! Batch dispatch with per-source failure isolation.

use crate::error::{IngestResult, TrackerError};
use crate::registry::{DispatchOutcome, ExtractorRegistry};
use crate::settings::resolve_settings;
use crate::store::SourceStore;
use crate::tracker::StatusTracker;
use quarry_core::{RagSettings, SourceDescriptor};
use tracing::{error, info, warn};

/// Routes each descriptor of a batch to its extractor and records the outcome.
pub struct Dispatcher {
    registry: ExtractorRegistry,
}

impl Dispatcher {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Process a batch, one source at a time and in input order.
    ///
    /// Settings are resolved once; if that fails the error is returned and no
    /// source is touched. Every other failure is confined to the source it
    /// happened on: it is logged, recorded as `FAILED` where possible, and the
    /// batch moves on. The outcome of each source is observable only through
    /// its persisted status.
    ///
    /// Dropping the returned future stops the batch at the source in flight,
    /// which stays `PROCESSING`.
    pub async fn dispatch<S: SourceStore + ?Sized>(
        &self,
        store: &S,
        batch: Vec<SourceDescriptor>,
    ) -> IngestResult<()> {
        let settings = resolve_settings(store).map_err(|e| {
            error!("Aborting batch of {} sources: {}", batch.len(), e);
            e
        })?;

        info!("Dispatching batch of {} sources", batch.len());

        let mut tracker = StatusTracker::new(store);
        for mut source in batch {
            source.stamp(&settings);
            self.process_one(&mut tracker, &source, &settings).await;
        }

        info!("Batch complete");
        Ok(())
    }

    async fn process_one<S: SourceStore + ?Sized>(
        &self,
        tracker: &mut StatusTracker<'_, S>,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) {
        match tracker.mark_processing(&source.id) {
            Ok(()) => {}
            Err(TrackerError::DuplicateAttempt(id)) => {
                warn!("Skipping duplicate source {} in batch", id);
                return;
            }
            Err(e @ TrackerError::AttemptInFlight { .. }) => {
                error!(
                    "Source {} ({}) not started: {}",
                    source.id, source.source_type, e
                );
                return;
            }
            Err(e) => {
                error!(
                    "Source {} ({}) could not be started: {}",
                    source.id, source.source_type, e
                );
                if let Err(e) = tracker.mark_failed(&source.id, &e.to_string()) {
                    error!("{}", e);
                }
                return;
            }
        }

        let result = match self.registry.dispatch(source, settings).await {
            Ok(DispatchOutcome::Extracted(summary)) => {
                info!(
                    "Source {} ({}): {} documents, {} chunks",
                    source.id, source.source_type, summary.documents, summary.chunks
                );
                tracker.mark_finished(&source.id)
            }
            Ok(DispatchOutcome::Skipped) => tracker.mark_finished(&source.id),
            Err(e) => {
                error!(
                    "Source {} ({}) failed{}: {}",
                    source.id,
                    source.source_type,
                    if e.is_transient() { " (transient)" } else { "" },
                    e
                );
                tracker.mark_failed(&source.id, &e.to_string())
            }
        };

        if let Err(e) = result {
            error!("{}", e);
        }
    }
}
