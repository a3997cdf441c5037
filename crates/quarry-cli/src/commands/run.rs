//! Dispatch a batch of sources.

use super::{get_config, get_database, status_label};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quarry_core::{Source, SourceDescriptor, SourceStatus, StatusCounts};
use quarry_db::Database;
use quarry_ingest::{default_registry, Dispatcher, ExtractorContext};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

/// Read a JSON array of descriptors.
fn read_batch(path: &Path) -> Result<Vec<SourceDescriptor>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of sources", path.display()))
}

/// Register batch sources the database has not seen yet, so their status can
/// be tracked.
fn register_new(db: &Database, batch: &[SourceDescriptor]) -> Result<usize> {
    let mut added = 0;
    for descriptor in batch {
        match db.get_source(&descriptor.id) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                db.create_source(&Source::new(descriptor.clone()))
                    .with_context(|| format!("Failed to register source {}", descriptor.id))?;
                added += 1;
            }
            Err(e) => return Err(e).context("Failed to look up source"),
        }
    }
    Ok(added)
}

pub fn run(batch_file: Option<PathBuf>, deadline_secs: Option<u64>) -> Result<()> {
    let config = get_config()?;
    let db = get_database()?;

    let batch = match &batch_file {
        Some(path) => {
            let batch = read_batch(path)?;
            let added = register_new(&db, &batch)?;
            if added > 0 {
                info!("Registered {} new sources from {}", added, path.display());
            }
            batch
        }
        None => db
            .pending_descriptors()
            .context("Failed to list pending sources")?,
    };

    if batch.is_empty() {
        println!("{}", "No sources to process.".dimmed());
        return Ok(());
    }

    let ids: Vec<String> = batch.iter().map(|s| s.id.clone()).collect();
    let ctx = ExtractorContext::from_config(db.clone(), &config)
        .context("Failed to set up extractors")?;
    let dispatcher = Dispatcher::new(default_registry(Arc::new(ctx)));

    let rt = Runtime::new().context("Failed to create async runtime")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Processing {} sources...", batch.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let deadline = deadline_secs.map(Duration::from_secs);
    let outcome = block_on_with_deadline(rt, deadline, dispatcher.dispatch(&db, batch));
    pb.finish_and_clear();

    match outcome {
        Some(result) => result.context("Batch aborted")?,
        None => println!(
            "{} Deadline reached; the source in flight stays PROCESSING.",
            "Note:".yellow().bold()
        ),
    }

    print_summary(&db, &ids)
}

/// Drive `fut` on `rt` until it completes or `deadline` passes.
///
/// On expiry the runtime is shut down without waiting for blocking tasks
/// still in flight, and `None` is returned.
fn block_on_with_deadline<F: Future>(
    rt: Runtime,
    deadline: Option<Duration>,
    fut: F,
) -> Option<F::Output> {
    let limit = match deadline {
        Some(limit) => limit,
        None => return Some(rt.block_on(fut)),
    };

    match rt.block_on(async move { tokio::time::timeout(limit, fut).await }) {
        Ok(output) => Some(output),
        Err(_) => {
            rt.shutdown_background();
            None
        }
    }
}

fn print_summary(db: &Database, ids: &[String]) -> Result<()> {
    let mut counts = StatusCounts::default();
    let mut failures = Vec::new();

    for id in ids {
        let source = match db.get_source(id) {
            Ok(source) => source,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e).context("Failed to read source status"),
        };
        match source.status {
            SourceStatus::Pending => counts.pending += 1,
            SourceStatus::Processing => counts.processing += 1,
            SourceStatus::Finished => counts.finished += 1,
            SourceStatus::Failed => {
                counts.failed += 1;
                failures.push(source);
            }
        }
    }

    println!("{}", "Batch Summary".cyan().bold());
    println!("{}", "─".repeat(50));
    for (status, count) in [
        (SourceStatus::Finished, counts.finished),
        (SourceStatus::Failed, counts.failed),
        (SourceStatus::Processing, counts.processing),
        (SourceStatus::Pending, counts.pending),
    ] {
        if count > 0 {
            println!("  {:<12} {}", status_label(status), count);
        }
    }

    if !failures.is_empty() {
        println!();
        println!("{}", "Failed Sources".red().bold());
        for source in &failures {
            println!(
                "  {} {} ({})",
                "✗".red(),
                source.id(),
                source.descriptor.source_type
            );
            if let Some(ref err) = source.error {
                println!("    {}", err.dimmed());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_read_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "a", "type": "text", "content": "hello"},
                {"id": "b", "type": "PDF", "location": "/tmp/b.pdf", "botId": "kb"}
            ]"#,
        )
        .unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].normalized_type(), "pdf");
        assert_eq!(batch[1].knowledge_base_id.as_deref(), Some("kb"));

        std::fs::write(&path, r#"{"id": "a"}"#).unwrap();
        assert!(read_batch(&path).is_err());
    }

    #[test]
    fn test_deadline_abandons_blocking_work() {
        let rt = Runtime::new().unwrap();
        let started = Instant::now();

        let outcome = block_on_with_deadline(rt, Some(Duration::from_millis(100)), async {
            tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(3))).await
        });

        assert!(outcome.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_batch_within_deadline_completes() {
        let rt = Runtime::new().unwrap();
        let outcome = block_on_with_deadline(rt, Some(Duration::from_secs(5)), async { 7 });
        assert_eq!(outcome, Some(7));

        let rt = Runtime::new().unwrap();
        assert_eq!(block_on_with_deadline(rt, None, async { 8 }), Some(8));
    }

    #[test]
    fn test_register_new_skips_known_sources() {
        let db = Database::open_in_memory().unwrap();
        let known = SourceDescriptor::new("known", "text").with_content("x");
        db.create_source(&Source::new(known.clone())).unwrap();

        let batch = vec![known, SourceDescriptor::new("fresh", "txt")];
        assert_eq!(register_new(&db, &batch).unwrap(), 1);
        assert!(db.get_source("fresh").unwrap().is_pending);
        assert_eq!(register_new(&db, &batch).unwrap(), 0);
    }
}
