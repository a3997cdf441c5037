//! Configuration commands.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_config::Config;

pub fn show() -> Result<()> {
    let paths = get_paths()?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if paths.config_file.exists() {
        let contents =
            std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;
        println!("{}", contents);
    } else {
        println!(
            "{} No config file at {}; built-in defaults apply:",
            "Note:".yellow().bold(),
            paths.config_file.display()
        );
        println!();
        println!("{}", Config::default_config_string());
    }

    println!("{} {}", "Database:".dimmed(), paths.database_file.display());

    Ok(())
}

pub fn path() -> Result<()> {
    let paths = get_paths()?;
    println!("{}", paths.config_file.display());
    Ok(())
}
