//! HTTP fetching and single-page website sources.

use super::{blocking, required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult, IngestError, IngestResult};
use crate::parsers::{html_to_text, ParsedDocument};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_config::FetchConfig;
use quarry_core::{RagSettings, SourceDescriptor};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Time page scripts get to run before a headless render is captured.
const RENDER_BUDGET_MS: u64 = 5_000;

/// HTTP client plus the headless browser fallback.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    browser: String,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(IngestError::HttpClient)?;

        Ok(Self {
            client,
            browser: config.browser.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and turn non-2xx responses into `HttpStatus` errors.
    pub async fn send(&self, url: &str, request: RequestBuilder) -> ExtractResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    pub async fn get_text(&self, url: &str) -> ExtractResult<String> {
        let response = self.send(url, self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    /// GET raw bytes, optionally with a bearer token.
    pub async fn get_bytes(&self, url: &str, token: Option<&str>) -> ExtractResult<Vec<u8>> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = format!("Bearer {}", token)
                .parse()
                .map_err(|_| ExtractError::InvalidField {
                    field: "token",
                    message: "not a valid header value".to_string(),
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let response = self.send(url, self.client.get(url).headers(headers)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a page's HTML, through the headless browser when `headless` is
    /// set so script-rendered content is included.
    pub async fn fetch_page(&self, url: &str, headless: bool) -> ExtractResult<String> {
        if headless {
            let browser = self.browser.clone();
            let target = url.to_string();
            return blocking(move || {
                quarry_process::render_page(&browser, &target, RENDER_BUDGET_MS)
                    .map_err(ExtractError::from)
            })
            .await;
        }

        debug!("Fetching {}", url);
        let request = self.client.get(url).header(ACCEPT, "text/html,*/*;q=0.8");
        let response = self.send(url, request).await?;
        Ok(response.text().await?)
    }
}

/// Parse and check an http(s) URL from a descriptor field.
pub(crate) fn parse_http_url(raw: &str) -> ExtractResult<Url> {
    let url = Url::parse(raw).map_err(|e| ExtractError::InvalidField {
        field: "location",
        message: format!("{}: {}", raw, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ExtractError::InvalidField {
            field: "location",
            message: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Visible text of a fetched page as a document.
pub(crate) fn page_document(url: &str, html: &str) -> ParsedDocument {
    let (title, text) = html_to_text(html);
    let doc = ParsedDocument::new(text).with_metadata(serde_json::json!({
        "format": "html",
        "url": url,
    }));
    match title {
        Some(t) => doc.with_title(t),
        None => doc,
    }
}

/// `website` sources: one page.
pub struct WebsiteExtractor {
    ctx: Arc<ExtractorContext>,
}

impl WebsiteExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Extractor for WebsiteExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let url = parse_http_url(required_location(source)?)?;

        info!(
            "Fetching {} ({})",
            url,
            if settings.use_headless_fetch { "headless" } else { "http" }
        );
        let html = self
            .ctx
            .fetcher
            .fetch_page(url.as_str(), settings.use_headless_fetch)
            .await?;

        let doc = page_document(url.as_str(), &html);
        store_documents(&self.ctx.db, source, settings, vec![doc]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com/a").is_ok());
        assert!(matches!(
            parse_http_url("ftp://example.com"),
            Err(ExtractError::InvalidField { .. })
        ));
        assert!(parse_http_url("not a url").is_err());
    }

    #[test]
    fn test_page_document() {
        let doc = page_document(
            "https://example.com",
            "<html><head><title>Home</title></head><body><p>Welcome</p></body></html>",
        );
        assert_eq!(doc.title.as_deref(), Some("Home"));
        assert_eq!(doc.content, "Welcome");
        assert_eq!(doc.metadata["url"], "https://example.com");
    }

    #[tokio::test]
    async fn test_headless_rejects_non_http() {
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch_page("file:///etc/hosts", true).await.unwrap_err();
        assert!(matches!(err, ExtractError::Process(_)));
    }
}
