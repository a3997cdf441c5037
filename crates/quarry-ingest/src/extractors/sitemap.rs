//! `sitemap` sources: every page listed in an XML sitemap.

use super::web::{page_document, parse_http_url};
use super::{required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::parsers::sitemap::parse_sitemap;
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use std::sync::Arc;
use tracing::{info, warn};

/// Reads the sitemap at `location`, following one level of sitemap index, and
/// ingests up to `fetch.max_sitemap_pages` pages (or `options.max_pages`).
pub struct SitemapExtractor {
    ctx: Arc<ExtractorContext>,
}

impl SitemapExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }

    async fn page_urls(&self, sitemap_url: &str, limit: usize) -> ExtractResult<Vec<String>> {
        let xml = self.ctx.fetcher.get_text(sitemap_url).await?;
        let entries = parse_sitemap(&xml)?;
        let mut pages = entries.pages;

        for nested in entries.sitemaps {
            if pages.len() >= limit {
                break;
            }
            let nested_pages = match self.ctx.fetcher.get_text(&nested).await {
                Ok(xml) => parse_sitemap(&xml).map(|e| e.pages),
                Err(e) => Err(e),
            };
            match nested_pages {
                Ok(found) => pages.extend(found),
                Err(e) => warn!("Skipping nested sitemap {}: {}", nested, e),
            }
        }

        pages.dedup();
        pages.truncate(limit);
        Ok(pages)
    }
}

#[async_trait]
impl Extractor for SitemapExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let sitemap_url = parse_http_url(required_location(source)?)?;
        let limit = source
            .option_u64("max_pages")
            .map(|n| n as usize)
            .unwrap_or(self.ctx.max_sitemap_pages)
            .max(1);

        let urls = self.page_urls(sitemap_url.as_str(), limit).await?;
        if urls.is_empty() {
            return Err(ExtractError::NoContent(sitemap_url.to_string()));
        }
        info!("Sitemap {} lists {} pages", sitemap_url, urls.len());

        let mut documents = Vec::with_capacity(urls.len());
        for url in &urls {
            match self
                .ctx
                .fetcher
                .fetch_page(url, settings.use_headless_fetch)
                .await
            {
                Ok(html) => documents.push(page_document(url, &html)),
                Err(e) => warn!("Skipping {}: {}", url, e),
            }
        }

        store_documents(&self.ctx.db, source, settings, documents).await
    }
}
