//! Status command - show source counts and sources needing attention.

use super::get_database;
use anyhow::Result;
use colored::Colorize;
use quarry_core::SourceStatus;

pub fn run() -> Result<()> {
    let db = get_database()?;

    println!("{}", "Quarry Status".cyan().bold());
    println!("{}", "─".repeat(50));

    let counts = db.status_counts()?;

    println!();
    println!("{}", "Sources".white().bold());
    println!("  {} Pending: {}", "○".yellow(), counts.pending);
    println!("  {} Processing: {}", "◐".blue(), counts.processing);
    println!("  {} Finished: {}", "●".green(), counts.finished);
    if counts.failed > 0 {
        println!("  {} Failed: {}", "✗".red(), counts.failed);
    }
    println!("  Chunks stored: {}", db.count_chunks()?);

    let processing = db.list_sources(Some(SourceStatus::Processing))?;
    if !processing.is_empty() {
        println!();
        println!("{}", "Processing".white().bold());
        for source in &processing {
            println!(
                "  {} {} ({})",
                "▶".blue(),
                source.id(),
                source.descriptor.source_type
            );
        }
    }

    let failed = db.list_sources(Some(SourceStatus::Failed))?;
    if !failed.is_empty() {
        println!();
        println!("{}", "Failed Sources".red().bold());
        for source in failed.iter().rev().take(5) {
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
        if failed.len() > 5 {
            println!("  {} ...and {} more", "".dimmed(), failed.len() - 5);
        }
    }

    if counts.total() == 0 {
        println!();
        println!(
            "{}",
            "No sources yet. Use 'quarry add <type>' to register one.".dimmed()
        );
    }

    Ok(())
}
