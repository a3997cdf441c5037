//! List registered sources.

use super::{get_database, parse_status, status_label, truncate};
use anyhow::Result;
use colored::Colorize;
use quarry_core::Source;

/// What a source points at, for display.
fn target(source: &Source) -> String {
    let descriptor = &source.descriptor;
    match (&descriptor.location, &descriptor.content) {
        (Some(location), _) => location.clone(),
        (None, Some(content)) => format!("\"{}\"", truncate(content, 40)),
        (None, None) => "-".to_string(),
    }
}

pub fn run(status: Option<String>) -> Result<()> {
    let filter = status.as_deref().map(parse_status).transpose()?;

    let db = get_database()?;
    let sources = db.list_sources(filter)?;

    if sources.is_empty() {
        println!("{}", "No sources found.".dimmed());
        return Ok(());
    }

    println!("{}", "Sources".cyan().bold());
    println!("{}", "─".repeat(70));

    for source in &sources {
        println!(
            "{} {:<8} {:<10} {}",
            source.id().dimmed(),
            source.descriptor.source_type,
            status_label(source.status),
            truncate(&target(source), 60)
        );
        if let Some(ref kb) = source.descriptor.knowledge_base_id {
            println!("    knowledge base: {}", kb);
        }
        if let Some(ref err) = source.error {
            println!("    {}", err.red());
        }
    }

    println!();
    println!("{} sources", sources.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::SourceDescriptor;

    #[test]
    fn test_target_prefers_location() {
        let source = Source::new(
            SourceDescriptor::new("a", "pdf")
                .with_location("/tmp/a.pdf")
                .with_content("ignored"),
        );
        assert_eq!(target(&source), "/tmp/a.pdf");

        let source = Source::new(SourceDescriptor::new("b", "text").with_content("inline"));
        assert_eq!(target(&source), "\"inline\"");

        assert_eq!(target(&Source::new(SourceDescriptor::new("c", "zip"))), "-");
    }
}
