//! Tenant ingestion settings.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_core::RagSettings;

fn print_settings(settings: &RagSettings) {
    println!("  Chunk size:     {}", settings.chunk_size);
    println!("  Chunk overlap:  {}", settings.chunk_overlap);
    println!("  Headless fetch: {}", settings.use_headless_fetch);
}

pub fn show() -> Result<()> {
    let db = get_database()?;
    let settings = db
        .get_rag_settings()
        .context("Failed to load ingestion settings")?;

    println!("{}", "Ingestion Settings".cyan().bold());
    println!("{}", "─".repeat(50));
    print_settings(&settings);

    Ok(())
}

/// Apply the given changes on top of the stored settings.
fn apply(
    mut settings: RagSettings,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    headless_fetch: Option<bool>,
) -> RagSettings {
    if let Some(size) = chunk_size {
        settings.chunk_size = size;
    }
    if let Some(overlap) = chunk_overlap {
        settings.chunk_overlap = overlap;
    }
    if let Some(headless) = headless_fetch {
        settings.use_headless_fetch = headless;
    }
    settings
}

pub fn set(
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    headless_fetch: Option<bool>,
) -> Result<()> {
    if chunk_size.is_none() && chunk_overlap.is_none() && headless_fetch.is_none() {
        anyhow::bail!("Nothing to change. Pass --chunk-size, --chunk-overlap or --headless-fetch.");
    }

    let db = get_database()?;
    let current = db
        .get_rag_settings()
        .context("Failed to load ingestion settings")?;

    let updated = apply(current, chunk_size, chunk_overlap, headless_fetch);
    updated.validate()?;
    db.set_rag_settings(&updated)
        .context("Failed to save ingestion settings")?;

    println!("{} Settings updated", "✓".green());
    print_settings(&updated);

    Ok(())
}
