//! HTML parsing: visible text and outgoing links.

use super::{DocumentParser, ParsedDocument};
use crate::error::{ExtractError, ExtractResult};
use scraper::{Html, Selector};
use url::Url;

/// Elements whose text is never shown to a reader.
const HIDDEN: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// Block elements that start a new line of text.
const BLOCKS: [&str; 16] = [
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "pre",
];

/// Parser for saved HTML files.
pub struct HtmlParser;

impl DocumentParser for HtmlParser {
    fn parse_bytes(&self, _name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        let html = String::from_utf8_lossy(data);
        let (title, text) = html_to_text(&html);

        let doc = ParsedDocument::new(text).with_metadata(serde_json::json!({ "format": "html" }));
        Ok(match title {
            Some(t) => doc.with_title(t),
            None => doc,
        })
    }

    fn extensions(&self) -> &[&str] {
        &["html", "htm", "xhtml"]
    }
}

fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::parse("CSS selector", format!("{:?}", e)))
}

/// The page title and its visible text, one line per block element.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = selector("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let root = selector("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCKS.contains(&element.name()) && !text.ends_with('\n') && !text.is_empty() {
                text.push('\n');
            }
            continue;
        }

        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| HIDDEN.contains(&e.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let words = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
        if words.is_empty() {
            continue;
        }
        if !text.is_empty() && !text.ends_with('\n') {
            text.push(' ');
        }
        text.push_str(&words);
    }

    (title, text.trim().to_string())
}

/// Absolute http(s) links of a page, resolved against `base`, without
/// fragments and without duplicates.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let Ok(anchors) = selector("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut links: Vec<Url> = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href.trim()) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        url.set_fragment(None);
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
  <head><title> Quarry Docs </title><style>body { color: red; }</style></head>
  <body>
    <h1>Getting started</h1>
    <p>Install the   binary.</p>
    <script>console.log("hidden");</script>
    <ul><li>One</li><li>Two</li></ul>
    <a href="/guide#intro">Guide</a>
    <a href="https://other.example.org/page">Elsewhere</a>
    <a href="mailto:team@example.com">Mail</a>
    <a href="guide">Guide again</a>
  </body>
</html>"#;

    #[test]
    fn test_visible_text() {
        let (title, text) = html_to_text(PAGE);

        assert_eq!(title.as_deref(), Some("Quarry Docs"));
        assert!(text.contains("Getting started"));
        assert!(text.contains("Install the binary."));
        assert!(text.contains("One\nTwo"));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_extract_links() {
        let base = Url::parse("https://docs.example.com/").unwrap();
        let links: Vec<String> = extract_links(PAGE, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect();

        assert_eq!(
            links,
            vec![
                "https://docs.example.com/guide",
                "https://other.example.org/page",
            ]
        );
    }
}
