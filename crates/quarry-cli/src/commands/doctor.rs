//! Check external tool availability and database health.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_db::Database;
use quarry_process::check_dependencies;

/// Source types that cannot run without the given tool.
fn needed_by(tool: &str) -> &'static str {
    match tool {
        "ffmpeg" => "mp4",
        "ffprobe" => "mp3, mp4, youtube (durations)",
        "whisper" => "mp3, mp4, youtube",
        "yt-dlp" => "youtube",
        "chromium" => "website, crawl, sitemap with headless fetch",
        _ => "",
    }
}

pub fn run() -> Result<()> {
    println!("{}", "External Tools".cyan().bold());
    println!("{}", "─".repeat(50));

    let mut missing = 0;
    for (tool, available) in check_dependencies() {
        if available {
            println!("  {} {}", "✓".green(), tool);
        } else {
            missing += 1;
            println!(
                "  {} {} {}",
                "✗".red(),
                tool,
                format!("(needed by {})", needed_by(tool)).dimmed()
            );
        }
    }

    println!();
    if missing == 0 {
        println!("{}", "All tools found.".green());
    } else {
        println!(
            "{} {} tool(s) missing; sources that need them will fail.",
            "Note:".yellow().bold(),
            missing
        );
    }

    println!();
    check_database()
}

fn check_database() -> Result<()> {
    println!("{}", "Database".cyan().bold());
    println!("{}", "─".repeat(50));

    let paths = get_paths()?;
    if !paths.is_initialized() {
        println!(
            "  {} {}",
            "-".dimmed(),
            "not initialized (run 'quarry init')".dimmed()
        );
        return Ok(());
    }

    let db = Database::open(&paths.database_file).context("Failed to open database")?;
    if integrity_ok(&db)? {
        println!("  {} {}", "✓".green(), paths.database_file.display());
    } else {
        println!(
            "  {} {} {}",
            "✗".red(),
            paths.database_file.display(),
            "(integrity check failed)".dimmed()
        );
    }

    Ok(())
}

fn integrity_ok(db: &Database) -> Result<bool> {
    db.integrity_check().context("Failed to run integrity check")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_of_fresh_database() {
        let db = Database::open_in_memory().unwrap();
        assert!(integrity_ok(&db).unwrap());
    }

    #[test]
    fn test_integrity_of_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("quarry.db")).unwrap();
        assert!(integrity_ok(&db).unwrap());
    }

    #[test]
    fn test_needed_by_media_tools() {
        assert!(needed_by("whisper").contains("youtube"));
        assert_eq!(needed_by("unknown"), "");
    }
}
