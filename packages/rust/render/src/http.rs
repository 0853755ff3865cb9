//! [`PageRenderer`] that fetches pages over HTTP and converts them to Markdown.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use docsplit_crawler::{BrowserGate, USER_AGENT};
use docsplit_shared::{CanonicalUrl, DocsplitError, RenderConfig, Result};

use crate::markdown::html_to_markdown;
use crate::renderer::{PageRenderer, RenderedPage};

/// Renders pages to Markdown, one at a time through the shared [`BrowserGate`].
pub struct MarkdownRenderer {
    client: Client,
    gate: BrowserGate,
    content_selector: Option<String>,
    timeout: Duration,
}

impl MarkdownRenderer {
    pub fn new(gate: BrowserGate, config: &RenderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| DocsplitError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            gate,
            content_selector: config.content_selector.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Prefer `selector` for the content region of every page.
    pub fn with_content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selector = Some(selector.into());
        self
    }
}

#[async_trait]
impl PageRenderer for MarkdownRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &CanonicalUrl) -> Result<RenderedPage> {
        let _permit = self.gate.acquire().await?;

        let response = self
            .client
            .get(url.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DocsplitError::render(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsplitError::render(url.as_str(), format!("HTTP {status}")));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| DocsplitError::render(url.as_str(), format!("body read failed: {e}")))?;

        let converted = html_to_markdown(&html, &final_url, self.content_selector.as_deref())?;
        if converted.markdown.is_empty() {
            return Err(DocsplitError::render(url.as_str(), "rendered document is empty"));
        }

        debug!(bytes = converted.markdown.len(), "page rendered");
        Ok(RenderedPage::new(
            url.clone(),
            converted.title,
            converted.markdown.into_bytes(),
        ))
    }
}
