//! Show the chunks stored for a source.

use super::{get_database, status_label, truncate};
use anyhow::{Context, Result};
use colored::Colorize;

/// Format a transcript offset as `mm:ss`.
fn timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn run(source_id: &str, limit: usize) -> Result<()> {
    let db = get_database()?;

    let source = db
        .get_source(source_id)
        .with_context(|| format!("Source {} not found", source_id))?;
    let chunks = db.get_chunks_by_source(source_id)?;

    println!(
        "{} {} ({}, {})",
        "Source".cyan().bold(),
        source.id(),
        source.descriptor.source_type,
        status_label(source.status)
    );
    println!("{}", "─".repeat(70));

    if chunks.is_empty() {
        println!("{}", "No chunks stored for this source.".dimmed());
        return Ok(());
    }

    for chunk in chunks.iter().take(limit) {
        let span = match (chunk.start_time, chunk.end_time) {
            (Some(start), Some(end)) => format!(" [{} - {}]", timestamp(start), timestamp(end)),
            _ => String::new(),
        };
        println!(
            "{}{} {}",
            format!("#{}", chunk.chunk_index).yellow(),
            span.dimmed(),
            truncate(&chunk.content, 100)
        );
    }

    if chunks.len() > limit {
        println!("  {} ...and {} more", "".dimmed(), chunks.len() - limit);
    }

    Ok(())
}
