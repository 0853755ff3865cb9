//! In-memory [`Browser`] for tests: a scripted site with injectable failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use docsplit_shared::{CanonicalUrl, CrawlConfig, DocsplitError, Result};

use crate::browser::{Browser, Navigation};

/// Crawl settings with no settle delay and two tries per selector.
pub fn fast_config() -> CrawlConfig {
    CrawlConfig {
        selector_attempts: 2,
        selector_delay: Duration::from_millis(100),
        selector_timeout: Duration::ZERO,
        settle_delay: Duration::ZERO,
        ..CrawlConfig::default()
    }
}

#[derive(Debug, Clone)]
struct ScriptedPage {
    links: Vec<String>,
    regions: Vec<String>,
    hang_first: u32,
    fail_first: u32,
}

#[derive(Debug, Default)]
struct State {
    current: Option<CanonicalUrl>,
    attempts: HashMap<CanonicalUrl, u32>,
    navigations: Vec<(CanonicalUrl, Instant)>,
    waited: Vec<String>,
    extracted: Vec<String>,
    scrolls: usize,
}

/// A fake site. Unknown pages answer with HTTP 404.
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    pages: HashMap<CanonicalUrl, ScriptedPage>,
    failure_status: Option<u16>,
    state: Mutex<State>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page whose `main` region links to `links`.
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(
            CanonicalUrl::new(url),
            ScriptedPage {
                links: links.iter().map(|l| l.to_string()).collect(),
                regions: vec!["main".into(), "nav".into(), "body".into()],
                hang_first: 0,
                fail_first: 0,
            },
        );
        self
    }

    /// Replace the selectors present on `url`.
    pub fn regions(mut self, url: &str, regions: &[&str]) -> Self {
        if let Some(page) = self.pages.get_mut(&CanonicalUrl::new(url)) {
            page.regions = regions.iter().map(|r| r.to_string()).collect();
        }
        self
    }

    /// The first `n` navigations to `url` fail.
    pub fn failing_first(mut self, url: &str, n: u32) -> Self {
        if let Some(page) = self.pages.get_mut(&CanonicalUrl::new(url)) {
            page.fail_first = n;
        }
        self
    }

    /// The first `n` navigations to `url` never complete.
    pub fn hanging_first(mut self, url: &str, n: u32) -> Self {
        if let Some(page) = self.pages.get_mut(&CanonicalUrl::new(url)) {
            page.hang_first = n;
        }
        self
    }

    /// Failed navigations answer with this status instead of a network error.
    pub fn failure_status(mut self, status: u16) -> Self {
        self.failure_status = Some(status);
        self
    }

    pub fn navigation_times(&self, url: &str) -> Vec<Instant> {
        let target = CanonicalUrl::new(url);
        self.state()
            .navigations
            .iter()
            .filter(|(u, _)| *u == target)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Every navigated URL, in order.
    pub fn navigated(&self) -> Vec<String> {
        self.state()
            .navigations
            .iter()
            .map(|(u, _)| u.to_string())
            .collect()
    }

    pub fn waited_selectors(&self) -> Vec<String> {
        self.state().waited.clone()
    }

    pub fn extracted_regions(&self) -> Vec<String> {
        self.state().extracted.clone()
    }

    pub fn scrolls(&self) -> usize {
        self.state().scrolls
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_page(&self) -> Option<ScriptedPage> {
        let current = self.state().current.clone()?;
        self.pages.get(&current).cloned()
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&self, url: &CanonicalUrl, _timeout: Duration) -> Result<Navigation> {
        let attempt = {
            let mut state = self.state();
            state.navigations.push((url.clone(), Instant::now()));
            state.current = None;
            let attempt = state.attempts.entry(url.clone()).or_insert(0);
            *attempt += 1;
            *attempt
        };

        let Some(page) = self.pages.get(url) else {
            return Ok(Navigation {
                status: Some(404),
                headers: vec![],
            });
        };

        if attempt <= page.hang_first {
            std::future::pending::<()>().await;
        }

        if attempt <= page.hang_first + page.fail_first {
            return match self.failure_status {
                Some(code) => Ok(Navigation {
                    status: Some(code),
                    headers: vec![("retry-after".into(), "1".into())],
                }),
                None => Err(DocsplitError::Network(format!("{url}: connection reset"))),
            };
        }

        self.state().current = Some(url.clone());
        Ok(Navigation::ok())
    }

    async fn wait_for_region(&self, selector: &str, _timeout: Duration) -> bool {
        self.state().waited.push(selector.to_string());
        self.current_page()
            .is_some_and(|page| page.regions.iter().any(|r| r == selector))
    }

    async fn scroll_to_bottom(&self) {
        self.state().scrolls += 1;
    }

    async fn extract_anchors(&self, region_selector: &str) -> Vec<String> {
        self.state().extracted.push(region_selector.to_string());
        self.current_page().map(|page| page.links).unwrap_or_default()
    }
}
