//! `rest` sources: the body of one HTTP API call.

use super::web::parse_http_url;
use super::{required_location, store_documents, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::parsers::ParsedDocument;
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

/// Calls `location` with `options.method` (default GET), `options.headers`
/// (an object of strings) and `options.body` (a string, or JSON sent as
/// JSON). JSON responses are pretty-printed before chunking.
pub struct RestExtractor {
    ctx: Arc<ExtractorContext>,
}

impl RestExtractor {
    pub fn new(ctx: Arc<ExtractorContext>) -> Self {
        Self { ctx }
    }
}

fn request_method(source: &SourceDescriptor) -> ExtractResult<Method> {
    let raw = source.option_str("method").unwrap_or("GET").trim().to_uppercase();
    Method::from_bytes(raw.as_bytes()).map_err(|_| ExtractError::InvalidField {
        field: "method",
        message: raw.clone(),
    })
}

fn request_headers(source: &SourceDescriptor) -> ExtractResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let Some(object) = source.options.get("headers").and_then(|h| h.as_object()) else {
        return Ok(headers);
    };

    for (name, value) in object {
        let invalid = |message: String| ExtractError::InvalidField {
            field: "headers",
            message,
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let value = HeaderValue::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Pretty-print JSON bodies; leave anything else untouched.
fn render_body(body: &str, content_type: Option<&str>) -> String {
    let looks_json = content_type.map(|c| c.contains("json")).unwrap_or(false)
        || matches!(body.trim_start().chars().next(), Some('{') | Some('['));

    if looks_json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return pretty;
            }
        }
    }
    body.to_string()
}

#[async_trait]
impl Extractor for RestExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let url = parse_http_url(required_location(source)?)?;
        let method = request_method(source)?;
        let headers = request_headers(source)?;

        info!("Calling {} {}", method, url);

        let mut request = self
            .ctx
            .fetcher
            .client()
            .request(method.clone(), url.clone())
            .headers(headers);
        request = match source.options.get("body") {
            Some(serde_json::Value::String(body)) => request.body(body.clone()),
            Some(serde_json::Value::Null) | None => request,
            Some(body) => request.json(body),
        };

        let response = self.ctx.fetcher.send(url.as_str(), request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        let doc = ParsedDocument::new(render_body(&body, content_type.as_deref()))
            .with_title(url.as_str())
            .with_metadata(serde_json::json!({
                "format": "rest",
                "url": url.as_str(),
                "method": method.as_str(),
            }));

        store_documents(&self.ctx.db, source, settings, vec![doc]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_defaults_to_get() {
        let source = SourceDescriptor::new("r", "rest");
        assert_eq!(request_method(&source).unwrap(), Method::GET);

        let source = source.with_options(serde_json::json!({ "method": "post" }));
        assert_eq!(request_method(&source).unwrap(), Method::POST);

        let source = SourceDescriptor::new("r", "rest")
            .with_options(serde_json::json!({ "method": "NOT A METHOD" }));
        assert!(request_method(&source).is_err());
    }

    #[test]
    fn test_headers_from_options() {
        let source = SourceDescriptor::new("r", "rest").with_options(serde_json::json!({
            "headers": { "X-Api-Key": "secret", "X-Page": 2 }
        }));

        let headers = request_headers(&source).unwrap();
        assert_eq!(headers["x-api-key"], "secret");
        assert_eq!(headers["x-page"], "2");
    }

    #[test]
    fn test_render_body() {
        let pretty = render_body(r#"{"a":1,"b":[true]}"#, Some("application/json"));
        assert!(pretty.contains("\n  \"a\": 1"));

        assert_eq!(render_body("plain body", Some("text/plain")), "plain body");
        assert_eq!(render_body("{not json", None), "{not json");
    }
}
