//! The resilient fetch step: one page in, its outbound links out.
//!
//! 1. Navigate with bounded retries and exponential backoff.
//! 2. Locate a link region through an ordered [`SelectorStrategy`] chain.
//! 3. Scroll to the bottom and wait for lazily rendered links to settle.
//! 4. Extract, canonicalize, dedup and filter the anchors.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use docsplit_shared::{CanonicalUrl, CrawlConfig, DocsplitError, Result, UrlPattern};

use crate::browser::{Browser, BrowserGate, Navigation};

/// Selector used when neither configured region is present.
pub const GENERIC_REGION_SELECTOR: &str = "body";

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded retries with exponential backoff between navigation attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for RetryPolicy {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff,
            multiplier: config.backoff_multiplier,
        }
    }
}

// ---------------------------------------------------------------------------
// Selector fallback chain
// ---------------------------------------------------------------------------

/// One way of locating the link region of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorStrategy {
    /// Label used in logs ("content", "nav", "generic").
    pub name: String,
    pub selector: String,
    /// Tries before moving to the next strategy.
    pub attempts: u32,
    /// Fixed delay between tries.
    pub delay: Duration,
    /// Poll timeout passed to the browser for each try.
    pub timeout: Duration,
}

impl SelectorStrategy {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            attempts: 1,
            delay: Duration::ZERO,
            timeout: Duration::ZERO,
        }
    }

    pub fn retried(mut self, attempts: u32, delay: Duration, timeout: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.delay = delay;
        self.timeout = timeout;
        self
    }
}

/// The default chain: configured content selector, then nav selector, then any anchor in `<body>`.
pub fn default_strategies(config: &CrawlConfig) -> Vec<SelectorStrategy> {
    let retried = |name: &str, selector: &str| {
        SelectorStrategy::new(name, selector).retried(
            config.selector_attempts,
            config.selector_delay,
            config.selector_timeout,
        )
    };

    vec![
        retried("content", &config.content_selector),
        retried("nav", &config.nav_selector),
        SelectorStrategy::new("generic", GENERIC_REGION_SELECTOR).retried(
            1,
            Duration::ZERO,
            config.selector_timeout,
        ),
    ]
}

// ---------------------------------------------------------------------------
// FetchStep
// ---------------------------------------------------------------------------

/// Navigates to a page and reports the links it exposes.
pub struct FetchStep {
    browser: Arc<dyn Browser>,
    gate: BrowserGate,
    retry: RetryPolicy,
    strategies: Vec<SelectorStrategy>,
    navigation_timeout: Duration,
    settle_delay: Duration,
}

impl FetchStep {
    pub fn new(browser: Arc<dyn Browser>, gate: BrowserGate, config: &CrawlConfig) -> Self {
        Self {
            browser,
            gate,
            retry: RetryPolicy::from(config),
            strategies: default_strategies(config),
            navigation_timeout: config.navigation_timeout,
            settle_delay: config.settle_delay,
        }
    }

    /// Replace the selector fallback chain.
    pub fn with_strategies(mut self, strategies: Vec<SelectorStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn strategies(&self) -> &[SelectorStrategy] {
        &self.strategies
    }

    /// Fetch `url` and return its outbound links matching `pattern`, in page order.
    ///
    /// Exhausted navigation retries return [`DocsplitError::NavigationFailed`];
    /// a page with no locatable link region yields an empty list.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &CanonicalUrl, pattern: &UrlPattern) -> Result<Vec<CanonicalUrl>> {
        let _permit = self.gate.acquire().await?;

        self.navigate_with_retry(url).await?;

        let strategy = match self.locate_region(url).await {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!(error = %e, "no link region found, treating page as leaf");
                return Ok(Vec::new());
            }
        };

        self.browser.scroll_to_bottom().await;
        if !self.settle_delay.is_zero() {
            debug!(settle_ms = self.settle_delay.as_millis() as u64, "waiting for lazy content");
            tokio::time::sleep(self.settle_delay).await;
        }

        let raw = self.browser.extract_anchors(&strategy.selector).await;
        let links = filter_links(url, &raw, pattern);

        debug!(
            strategy = %strategy.name,
            anchors = raw.len(),
            links = links.len(),
            "links extracted"
        );

        Ok(links)
    }

    async fn navigate_with_retry(&self, url: &CanonicalUrl) -> Result<Navigation> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_status = None;
        let mut last_headers = Vec::new();
        let mut last_message = String::new();

        for attempt in 1..=max_attempts {
            let outcome = tokio::time::timeout(
                self.navigation_timeout,
                self.browser.navigate(url, self.navigation_timeout),
            )
            .await;

            match outcome {
                Ok(Ok(nav)) if nav.is_success() => {
                    if attempt > 1 {
                        info!(attempt, "navigation succeeded after retry");
                    }
                    return Ok(nav);
                }
                Ok(Ok(nav)) => {
                    last_message = match nav.status {
                        Some(code) => format!("HTTP {code}"),
                        None => "navigation rejected".to_string(),
                    };
                    last_status = nav.status;
                    last_headers = nav.headers;
                }
                Ok(Err(e)) => last_message = e.to_string(),
                Err(_) => {
                    last_message = format!(
                        "timed out after {}ms",
                        self.navigation_timeout.as_millis()
                    );
                }
            }

            if attempt < max_attempts {
                let backoff = self.retry.backoff(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    status = ?last_status,
                    error = %last_message,
                    "navigation failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        warn!(
            attempts = max_attempts,
            status = ?last_status,
            headers = ?last_headers,
            error = %last_message,
            "navigation retries exhausted"
        );

        Err(DocsplitError::NavigationFailed {
            url: url.to_string(),
            attempts: max_attempts,
            last_status,
            last_headers,
            message: last_message,
        })
    }

    async fn locate_region(&self, url: &CanonicalUrl) -> Result<&SelectorStrategy> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            for attempt in 1..=strategy.attempts {
                if self
                    .browser
                    .wait_for_region(&strategy.selector, strategy.timeout)
                    .await
                {
                    debug!(strategy = %strategy.name, selector = %strategy.selector, attempt, "link region found");
                    return Ok(strategy);
                }
                if attempt < strategy.attempts && !strategy.delay.is_zero() {
                    tokio::time::sleep(strategy.delay).await;
                }
            }

            if let Some(next) = self.strategies.get(index + 1) {
                info!(
                    strategy = %strategy.name,
                    selector = %strategy.selector,
                    next = %next.name,
                    next_selector = %next.selector,
                    "selector unavailable, falling back"
                );
            }
        }

        Err(DocsplitError::SelectorNotFound {
            url: url.to_string(),
            tried: self.strategies.iter().map(|s| s.selector.clone()).collect(),
        })
    }
}

/// Resolve, canonicalize, dedup (first occurrence wins) and filter raw hrefs.
///
/// Links back to `page` itself are dropped.
pub fn filter_links(page: &CanonicalUrl, raw: &[String], pattern: &UrlPattern) -> Vec<CanonicalUrl> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|href| page.join(href))
        .filter(|link| link != page && pattern.is_match(link))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
