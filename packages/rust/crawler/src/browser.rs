//! Browser capability interface and the one-at-a-time gate in front of it.
//!
//! The crawler never drives a browser directly: it talks to a [`Browser`]
//! implementation, which holds a single stateful page. Because that page can
//! only service one navigation at a time, every caller (the fetch step and the
//! renderer) first takes the [`BrowserGate`] permit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use docsplit_shared::{CanonicalUrl, DocsplitError, Result};

/// Outcome of one successful navigation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// Response status of the main document, if the browser exposes it.
    pub status: Option<u16>,
    /// Response headers of the main document.
    pub headers: Vec<(String, String)>,
}

impl Navigation {
    pub fn ok() -> Self {
        Self {
            status: Some(200),
            headers: Vec::new(),
        }
    }

    /// A navigation with no status, or a status below 400, counts as loaded.
    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|code| code < 400)
    }
}

/// A single navigable page context.
///
/// Implementations wait for the network to settle before `navigate` returns.
/// `extract_anchors` should return absolute hrefs where it can; relative ones
/// are resolved against the navigated URL by the caller.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load `url` into the page, bounded by `timeout`.
    async fn navigate(&self, url: &CanonicalUrl, timeout: Duration) -> Result<Navigation>;

    /// Poll until an element matching `selector` exists, up to `timeout`.
    async fn wait_for_region(&self, selector: &str, timeout: Duration) -> bool;

    /// Scroll the loaded page to the bottom to trigger lazy rendering.
    async fn scroll_to_bottom(&self);

    /// `href` values of every anchor inside elements matching `region_selector`.
    async fn extract_anchors(&self, region_selector: &str) -> Vec<String>;
}

/// Concurrency limiter admitting exactly one browser operation at a time.
#[derive(Debug, Clone)]
pub struct BrowserGate {
    permits: Arc<Semaphore>,
}

impl BrowserGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait for the browser to be free. The browser is held until the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DocsplitError::Network("browser gate closed".into()))
    }

    /// Whether an operation currently holds the browser.
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for BrowserGate {
    fn default() -> Self {
        Self::new()
    }
}
