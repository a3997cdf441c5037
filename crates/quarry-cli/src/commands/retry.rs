//! Queue sources for another attempt.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_core::SourceStatus;
use quarry_db::Database;

/// Reset the named sources, plus every failed source when `all_failed` is
/// set, back to PENDING. Returns the ids that were reset.
fn retry_sources(db: &Database, ids: &[String], all_failed: bool) -> Result<Vec<String>> {
    let mut targets: Vec<String> = ids.to_vec();
    if all_failed {
        let failed = db
            .list_sources(Some(SourceStatus::Failed))
            .context("Failed to list failed sources")?;
        for source in failed {
            if !targets.contains(&source.descriptor.id) {
                targets.push(source.descriptor.id);
            }
        }
    }

    for id in &targets {
        db.reset_source(id)
            .with_context(|| format!("Failed to reset source {}", id))?;
    }

    Ok(targets)
}

pub fn run(ids: Vec<String>, all_failed: bool) -> Result<()> {
    if ids.is_empty() && !all_failed {
        anyhow::bail!("Name one or more source IDs, or pass --failed");
    }

    let db = get_database()?;
    let reset = retry_sources(&db, &ids, all_failed)?;

    if reset.is_empty() {
        println!("{}", "No failed sources to retry.".dimmed());
        return Ok(());
    }

    for id in &reset {
        println!("{} {} is pending again", "✓".green(), id.dimmed());
    }
    println!();
    println!("{}", "Run 'quarry run' to process them.".dimmed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{Source, SourceDescriptor, StatusUpdate};

    fn failed_source(db: &Database, id: &str) {
        let descriptor = SourceDescriptor::new(id, "pdf").with_location("/tmp/missing.pdf");
        db.create_source(&Source::new(descriptor)).unwrap();
        db.update_source_status(id, &StatusUpdate::processing()).unwrap();
        db.update_source_status(id, &StatusUpdate::failed("file not found"))
            .unwrap();
    }

    #[test]
    fn test_retry_named_source() {
        let db = Database::open_in_memory().unwrap();
        failed_source(&db, "a");
        failed_source(&db, "b");

        let reset = retry_sources(&db, &["a".to_string()], false).unwrap();
        assert_eq!(reset, vec!["a".to_string()]);

        let a = db.get_source("a").unwrap();
        assert_eq!(a.status, SourceStatus::Pending);
        assert!(a.is_pending);
        assert!(a.error.is_none());

        let pending: Vec<String> = db
            .pending_descriptors()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(pending, vec!["a".to_string()]);
        assert_eq!(db.get_source("b").unwrap().status, SourceStatus::Failed);
    }

    #[test]
    fn test_retry_all_failed() {
        let db = Database::open_in_memory().unwrap();
        failed_source(&db, "a");
        failed_source(&db, "b");

        let reset = retry_sources(&db, &["a".to_string()], true).unwrap();
        assert_eq!(reset.len(), 2);
        assert_eq!(db.status_counts().unwrap().pending, 2);
        assert_eq!(db.status_counts().unwrap().failed, 0);
    }

    #[test]
    fn test_retry_unknown_source() {
        let db = Database::open_in_memory().unwrap();
        assert!(retry_sources(&db, &["ghost".to_string()], false).is_err());
    }
}
