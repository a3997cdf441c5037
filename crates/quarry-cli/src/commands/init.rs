//! Initialize Quarry.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_config::Config;
use quarry_db::Database;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} Quarry is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Database: {}", paths.database_file.display());
        return Ok(());
    }

    println!("{}", "Initializing Quarry...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    if !paths.config_file.exists() {
        Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
        println!(
            "  {} Created config: {}",
            "✓".green(),
            paths.config_file.display()
        );
    }
    let config = Config::load_from(&paths.config_file).context("Failed to load config")?;

    let db = Database::open(&paths.database_file).context("Failed to initialize database")?;
    println!(
        "  {} Created database: {}",
        "✓".green(),
        paths.database_file.display()
    );

    let settings = config.ingest.rag_settings();
    if db
        .seed_rag_settings(&settings)
        .context("Failed to seed ingestion settings")?
    {
        println!(
            "  {} Seeded settings: chunk size {}, overlap {}",
            "✓".green(),
            settings.chunk_size,
            settings.chunk_overlap
        );
    }

    println!();
    println!("{}", "Quarry initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Register a source: {}",
        "quarry add website --location https://example.com".cyan()
    );
    println!("  2. Process pending sources: {}", "quarry run".cyan());
    println!("  3. Check status: {}", "quarry status".cyan());

    Ok(())
}
