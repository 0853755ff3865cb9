//! Page discovery: browser capability, resilient fetch step, section tree builder.
//!
//! This crate provides:
//! - [`Browser`]: the navigation / region / anchor capability the crawler drives
//! - [`BrowserGate`]: the one-at-a-time limiter shared with the renderer
//! - [`FetchStep`]: retrying navigation plus the selector fallback chain
//! - [`TreeBuilder`]: recursive, visited-set bounded construction of a [`SectionNode`] tree
//! - [`HttpBrowser`]: a static-HTML `Browser` over `reqwest` + `scraper`
//!
//! [`SectionNode`]: docsplit_shared::SectionNode

pub mod browser;
pub mod fetch;
pub mod http;
pub mod tree;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use browser::{Browser, BrowserGate, Navigation};
pub use fetch::{
    FetchStep, GENERIC_REGION_SELECTOR, RetryPolicy, SelectorStrategy, default_strategies,
    filter_links,
};
pub use http::{HttpBrowser, USER_AGENT};
pub use tree::{CrawlProgress, TreeBuilder, VisitedSet};
