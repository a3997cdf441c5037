//! Register a pending source.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use quarry_core::{new_id, Source, SourceDescriptor, SourceType};

/// Build a descriptor from command-line arguments.
fn build_descriptor(
    source_type: &str,
    location: Option<String>,
    content: Option<String>,
    options: Option<String>,
    knowledge_base: Option<String>,
) -> Result<SourceDescriptor> {
    let mut descriptor = SourceDescriptor::new(new_id(), source_type.trim().to_lowercase());
    descriptor.location = location;
    descriptor.content = content;
    descriptor.knowledge_base_id = knowledge_base;

    if let Some(raw) = options {
        let value: serde_json::Value =
            serde_json::from_str(&raw).context("--options must be valid JSON")?;
        if !value.is_object() {
            anyhow::bail!("--options must be a JSON object");
        }
        descriptor.options = value;
    }

    Ok(descriptor)
}

pub fn run(
    source_type: &str,
    location: Option<String>,
    content: Option<String>,
    options: Option<String>,
    knowledge_base: Option<String>,
) -> Result<()> {
    let descriptor = build_descriptor(source_type, location, content, options, knowledge_base)?;

    if descriptor.known_type().is_none() {
        let known: Vec<&str> = SourceType::ALL.iter().map(|t| t.as_str()).collect();
        println!(
            "{} '{}' is not a built-in type ({}); it will be marked finished without extraction.",
            "Note:".yellow().bold(),
            descriptor.source_type,
            known.join(", ")
        );
    }

    let db = get_database()?;
    let source = Source::new(descriptor);
    db.create_source(&source)
        .context("Failed to register source")?;

    println!(
        "{} Added {} source {}",
        "✓".green(),
        source.descriptor.source_type.cyan(),
        source.id()
    );

    Ok(())
}
