//! Rendering capabilities consumed by the artifact assembler.

use async_trait::async_trait;

use docsplit_shared::{CanonicalUrl, Result};

/// One page turned into its portable document form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: CanonicalUrl,
    /// Page title when one could be found.
    pub title: Option<String>,
    pub bytes: Vec<u8>,
}

impl RenderedPage {
    pub fn new(url: CanonicalUrl, title: Option<String>, bytes: Vec<u8>) -> Self {
        Self { url, title, bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns one page into a standalone document.
///
/// An `Err` or an empty [`RenderedPage`] both mean the page could not be rendered.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &CanonicalUrl) -> Result<RenderedPage>;
}

/// Concatenates rendered pages, in the given order, into one document.
pub trait DocumentMerger: Send + Sync {
    /// File extension of merged documents, without the dot.
    fn extension(&self) -> &str;

    fn merge(&self, root: &CanonicalUrl, pages: &[RenderedPage]) -> Result<Vec<u8>>;
}
