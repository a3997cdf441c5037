//! Markdown document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::ExtractResult;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

/// Parser for Markdown files. Code blocks are kept, fenced.
pub struct MarkdownParser;

/// Plain text of a markdown document, its first H1 and its link targets.
pub(crate) fn markdown_to_text(markdown: &str) -> (String, Option<String>, Vec<String>) {
    let mut text = String::new();
    let mut title: Option<String> = None;
    let mut links = Vec::new();
    let mut heading: Option<(HeadingLevel, String)> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                heading = Some((level, String::new()));
            }
            Event::End(Tag::Heading(_, _, _)) => {
                if let Some((level, current)) = heading.take() {
                    if level == HeadingLevel::H1 && title.is_none() {
                        title = Some(current.trim().to_string());
                    }
                    text.push_str(current.trim());
                    text.push_str("\n\n");
                }
            }
            Event::Start(Tag::CodeBlock(_)) => text.push_str("```\n"),
            Event::End(Tag::CodeBlock(_)) => text.push_str("```\n\n"),
            Event::Start(Tag::Link(_, dest, _)) => links.push(dest.to_string()),
            Event::End(Tag::Paragraph) => text.push_str("\n\n"),
            Event::End(Tag::List(_)) => text.push('\n'),
            Event::Start(Tag::Item) => text.push_str("- "),
            Event::End(Tag::Item) => text.push('\n'),
            Event::Text(t) => match heading.as_mut() {
                Some((_, current)) => current.push_str(&t),
                None => text.push_str(&t),
            },
            Event::Code(code) => {
                text.push('`');
                text.push_str(&code);
                text.push('`');
            }
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }

    (text.trim().to_string(), title, links)
}

impl DocumentParser for MarkdownParser {
    fn parse_bytes(&self, _name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        let markdown = String::from_utf8_lossy(data);
        let (text, title, links) = markdown_to_text(&markdown);

        let doc = ParsedDocument::new(text).with_metadata(serde_json::json!({
            "format": "markdown",
            "links": links,
        }));

        Ok(match title {
            Some(t) => doc.with_title(t),
            None => doc,
        })
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkd", "mdx"]
    }
}
