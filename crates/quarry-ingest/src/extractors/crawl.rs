//! `crawl` sources: a breadth-first walk of one site.

use super::web::{page_document, parse_http_url};
use super::{required_location, store_documents, ExtractorContext};
use crate::error::ExtractResult;
use crate::parsers::{extract_links, ParsedDocument};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

const DEFAULT_MAX_DEPTH: u64 = 2;

/// Follows links from `location` on the same host.
///
/// Options: `max_depth` (default 2) and `max_links`, the page budget
/// (default `fetch.max_crawl_pages`). Only a failure on the start page fails
/// the source; later pages that cannot be fetched are skipped.
pub struct CrawlExtractor {
    ctx: Arc<ExtractorContext>,
}

impl CrawlExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }
}

/// Key used to avoid fetching a page twice.
fn visit_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().trim_end_matches('/').to_string()
}

fn same_site(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

#[async_trait]
impl Extractor for CrawlExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let start = parse_http_url(required_location(source)?)?;
        let max_depth = source.option_u64("max_depth").unwrap_or(DEFAULT_MAX_DEPTH);
        let max_pages = source
            .option_u64("max_links")
            .map(|n| n as usize)
            .unwrap_or(self.ctx.max_crawl_pages)
            .max(1);

        info!(
            "Crawling {} (depth {}, up to {} pages)",
            start, max_depth, max_pages
        );

        let mut queue: VecDeque<(Url, u64)> = VecDeque::from([(start.clone(), 0)]);
        let mut seen: HashSet<String> = HashSet::from([visit_key(&start)]);
        let mut documents: Vec<ParsedDocument> = Vec::new();

        while let Some((url, depth)) = queue.pop_front() {
            if documents.len() >= max_pages {
                break;
            }

            let html = match self
                .ctx
                .fetcher
                .fetch_page(url.as_str(), settings.use_headless_fetch)
                .await
            {
                Ok(html) => html,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            if depth < max_depth {
                for link in extract_links(&html, &url) {
                    if same_site(&start, &link) && seen.insert(visit_key(&link)) {
                        queue.push_back((link, depth + 1));
                    }
                }
            }

            documents.push(page_document(url.as_str(), &html));
        }

        info!("Crawled {} pages from {}", documents.len(), start);
        store_documents(&self.ctx.db, source, settings, documents).await
    }
}
