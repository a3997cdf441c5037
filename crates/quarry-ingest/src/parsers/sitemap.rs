//! XML sitemap parsing.

use crate::error::{ExtractError, ExtractResult};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Locations listed in a sitemap document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// Page URLs from `<urlset><url><loc>`.
    pub pages: Vec<String>,
    /// Nested sitemap URLs from `<sitemapindex><sitemap><loc>`.
    pub sitemaps: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Parent {
    None,
    Url,
    Sitemap,
}

/// Collect the `<loc>` entries of a sitemap or sitemap index.
pub fn parse_sitemap(xml: &str) -> ExtractResult<SitemapEntries> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = SitemapEntries::default();
    let mut parent = Parent::None;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => parent = Parent::Url,
                b"sitemap" => parent = Parent::Sitemap,
                b"loc" => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractError::parse("sitemap", err))?;
                loc.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => {
                    in_loc = false;
                    let value = loc.trim().to_string();
                    if !value.is_empty() {
                        match parent {
                            Parent::Sitemap => entries.sitemaps.push(value),
                            Parent::Url | Parent::None => entries.pages.push(value),
                        }
                    }
                }
                b"url" | b"sitemap" => parent = Parent::None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::parse("sitemap", e)),
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://example.com/a?x=1&amp;y=2 </loc></url>
</urlset>"#;

        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(
            entries.pages,
            vec!["https://example.com/", "https://example.com/a?x=1&y=2"]
        );
        assert!(entries.sitemaps.is_empty());
    }

    #[test]
    fn test_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/pages.xml</loc></sitemap>
  <sitemap><loc><![CDATA[https://example.com/posts.xml]]></loc></sitemap>
</sitemapindex>"#;

        let entries = parse_sitemap(xml).unwrap();
        assert!(entries.pages.is_empty());
        assert_eq!(
            entries.sitemaps,
            vec!["https://example.com/pages.xml", "https://example.com/posts.xml"]
        );
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse_sitemap("<urlset><url><loc>x</url></urlset>").is_err());
    }
}
