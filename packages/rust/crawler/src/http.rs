//! Static-HTML [`Browser`]: plain HTTP fetches parsed with `scraper`.
//!
//! Suitable for documentation sites that ship their navigation in the served
//! HTML. Nothing is executed, so `scroll_to_bottom` has nothing to trigger and
//! region waits resolve immediately against the loaded document.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use docsplit_shared::{CanonicalUrl, DocsplitError, Result};

use crate::browser::{Browser, Navigation};

/// User-Agent string for crawl requests.
pub const USER_AGENT: &str = concat!("docsplit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
struct LoadedPage {
    /// Final URL after redirects; relative hrefs resolve against it.
    url: Url,
    html: String,
}

/// A [`Browser`] backed by `reqwest`.
pub struct HttpBrowser {
    client: Client,
    current: Mutex<Option<LoadedPage>>,
}

impl HttpBrowser {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| DocsplitError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&self, url: &CanonicalUrl, timeout: Duration) -> Result<Navigation> {
        let mut current = self.current.lock().await;
        *current = None;

        debug!(%url, "navigating");
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DocsplitError::Network(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let final_url = response.url().clone();

        let html = response
            .text()
            .await
            .map_err(|e| DocsplitError::Network(format!("{url}: body read failed: {e}")))?;

        *current = Some(LoadedPage {
            url: final_url,
            html,
        });

        Ok(Navigation {
            status: Some(status),
            headers,
        })
    }

    async fn wait_for_region(&self, selector: &str, _timeout: Duration) -> bool {
        let current = self.current.lock().await;
        let Some(page) = current.as_ref() else {
            return false;
        };
        match parse_selector(selector) {
            Ok(sel) => Html::parse_document(&page.html).select(&sel).next().is_some(),
            Err(e) => {
                warn!(selector, error = %e, "invalid region selector");
                false
            }
        }
    }

    async fn scroll_to_bottom(&self) {}

    async fn extract_anchors(&self, region_selector: &str) -> Vec<String> {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(page) => region_anchors(&page.html, &page.url, region_selector),
            None => Vec::new(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| DocsplitError::parse(format!("invalid selector '{selector}': {e}")))
}

/// Absolute hrefs of every anchor inside the elements matching `region_selector`.
fn region_anchors(html: &str, base: &Url, region_selector: &str) -> Vec<String> {
    let (Ok(region_sel), Ok(anchor_sel)) = (parse_selector(region_selector), parse_selector("a[href]"))
    else {
        return Vec::new();
    };

    let doc = Html::parse_document(html);
    let mut hrefs = Vec::new();

    for region in doc.select(&region_sel) {
        for anchor in region.select(&anchor_sel) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            match base.join(href) {
                Ok(resolved) => hrefs.push(resolved.to_string()),
                Err(_) => hrefs.push(href.to_string()),
            }
        }
    }

    hrefs
}
