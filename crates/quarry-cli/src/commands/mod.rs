//! CLI command implementations.

pub mod add;
pub mod chunks;
pub mod config;
pub mod doctor;
pub mod init;
pub mod retry;
pub mod run;
pub mod settings;
pub mod sources;
pub mod status;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use quarry_config::{AppPaths, Config};
use quarry_core::SourceStatus;
use quarry_db::Database;

/// Get the application paths, relocated by `general.data_dir` if set.
pub fn get_paths() -> Result<AppPaths> {
    let defaults = AppPaths::new().context("Failed to determine application directories")?;
    let config = Config::load_from(&defaults.config_file).context("Failed to load config")?;
    config.paths().context("Failed to determine application directories")
}

/// Load the configuration file, falling back to defaults.
pub fn get_config() -> Result<Config> {
    let paths = AppPaths::new().context("Failed to determine application directories")?;
    Config::load_from(&paths.config_file).context("Failed to load config")
}

/// Get a database connection, ensuring quarry is initialized.
pub fn get_database() -> Result<Database> {
    let paths = get_paths()?;

    if !paths.is_initialized() {
        anyhow::bail!("Quarry is not initialized. Run 'quarry init' first.");
    }

    Database::open(&paths.database_file).context("Failed to open database")
}

/// Parse a status name as typed on the command line.
pub fn parse_status(raw: &str) -> Result<SourceStatus> {
    SourceStatus::from_str(raw).with_context(|| {
        format!(
            "Unknown status '{}' (expected pending, processing, finished or failed)",
            raw
        )
    })
}

/// A status label in its display colour.
pub fn status_label(status: SourceStatus) -> ColoredString {
    match status {
        SourceStatus::Pending => status.as_str().yellow(),
        SourceStatus::Processing => status.as_str().blue(),
        SourceStatus::Finished => status.as_str().green(),
        SourceStatus::Failed => status.as_str().red(),
    }
}

/// Shorten text to `max` characters for one-line display.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
