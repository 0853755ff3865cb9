//! Section tree builder: recursive, unlimited-depth expansion of the link graph.
//!
//! Each page is expanded at most once per build. A page reached again through
//! another link path still shows up as a childless reference at that spot.
//! Expansion depth is bounded only by the visited set.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use docsplit_shared::{CanonicalUrl, Result, SectionNode, UrlPattern, canonicalize};

use crate::fetch::FetchStep;

/// Canonical URLs already expanded during one tree build. Append-only.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    seen: HashSet<CanonicalUrl>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `url` visited. Returns `false` if it already was.
    pub fn insert(&mut self, url: CanonicalUrl) -> bool {
        self.seen.insert(url)
    }

    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Observer for pages as the builder expands them.
pub trait CrawlProgress: Send + Sync {
    fn page_discovered(&self, url: &CanonicalUrl, visited: usize);
}

impl CrawlProgress for () {
    fn page_discovered(&self, _url: &CanonicalUrl, _visited: usize) {}
}

/// Builds a [`SectionNode`] tree by driving a [`FetchStep`] recursively.
pub struct TreeBuilder<'a> {
    fetch: &'a FetchStep,
    progress: &'a dyn CrawlProgress,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(fetch: &'a FetchStep) -> Self {
        Self {
            fetch,
            progress: &(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn CrawlProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Build the tree rooted at `root` with a fresh visited set.
    ///
    /// Failure to navigate to the root is fatal; any other page that cannot be
    /// loaded becomes a leaf.
    #[instrument(skip_all, fields(root = %root, pattern = %pattern.as_str()))]
    pub async fn build(&self, root: &str, pattern: &UrlPattern) -> Result<SectionNode> {
        let mut visited = VisitedSet::new();
        let tree = self.build_with(root, pattern, &mut visited).await?;

        info!(
            pages = visited.len(),
            nodes = tree.node_count(),
            "section tree built"
        );

        Ok(tree)
    }

    /// Build the tree rooted at `root`, threading a caller-owned visited set.
    pub async fn build_with(
        &self,
        root: &str,
        pattern: &UrlPattern,
        visited: &mut VisitedSet,
    ) -> Result<SectionNode> {
        let root = canonicalize(root);
        self.expand(root, pattern, visited, true).await
    }

    async fn expand(
        &self,
        url: CanonicalUrl,
        pattern: &UrlPattern,
        visited: &mut VisitedSet,
        is_root: bool,
    ) -> Result<SectionNode> {
        if !visited.insert(url.clone()) {
            return Ok(SectionNode::leaf(url));
        }
        self.progress.page_discovered(&url, visited.len());

        let links = match self.fetch.fetch(&url, pattern).await {
            Ok(links) => links,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                warn!(url = %url, error = %e, "page could not be expanded, keeping it as a leaf");
                Vec::new()
            }
        };

        let mut children = Vec::with_capacity(links.len());
        for link in links.into_iter().filter(|l| pattern.is_match(l)) {
            let child = Box::pin(self.expand(link, pattern, visited, false)).await?;
            children.push(child);
        }

        Ok(SectionNode::with_children(url, children))
    }
}
