//! Headless browser rendering for pages that need JavaScript.

use crate::error::{ProcessError, ProcessResult};
use crate::tool;
use tracing::info;

/// Render `url` in a headless Chromium-family browser and return the DOM.
///
/// `budget_ms` bounds how long page scripts may run before the DOM is dumped.
pub fn render_page(browser: &str, url: &str, budget_ms: u64) -> ProcessResult<String> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ProcessError::InvalidInput(format!(
            "Only http(s) URLs can be rendered: {}",
            url
        )));
    }

    info!("Rendering {} with {}", url, browser);

    let budget = format!("--virtual-time-budget={}", budget_ms);
    let output = tool::run(
        browser,
        [
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--hide-scrollbars",
            budget.as_str(),
            "--dump-dom",
            url,
        ],
    )?;

    let html = String::from_utf8_lossy(&output.stdout).to_string();
    if html.trim().is_empty() {
        return Err(ProcessError::BadOutput {
            tool: browser.to_string(),
            message: format!("empty DOM for {}", url),
        });
    }

    Ok(html)
}
