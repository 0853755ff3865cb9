//! Artifact assembly: render every page of one section and merge the results.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use docsplit_render::{DocumentMerger, PageRenderer, RenderedPage};
use docsplit_shared::{Artifact, CanonicalUrl, DocsplitError, Result, SectionTree, slug_for};

use crate::progress::{ProgressReporter, SilentProgress};

// ---------------------------------------------------------------------------
// Processed set
// ---------------------------------------------------------------------------

/// Pages already handed to the renderer during one run, across all sections.
///
/// Append-only. A page is claimed by the first section that reaches it,
/// whether or not its render succeeds.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    claimed: HashSet<CanonicalUrl>,
    rendered: usize,
    failed: Vec<CanonicalUrl>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for rendering. Returns `false` if it was claimed before.
    pub fn claim(&mut self, url: &CanonicalUrl) -> bool {
        self.claimed.insert(url.clone())
    }

    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.claimed.contains(url)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Pages rendered successfully so far.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// Pages whose render failed, in attempt order.
    pub fn failed(&self) -> &[CanonicalUrl] {
        &self.failed
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Renders and merges sections through the given collaborators.
pub struct Assembler<'a> {
    renderer: &'a dyn PageRenderer,
    merger: &'a dyn DocumentMerger,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Assembler<'a> {
    pub fn new(renderer: &'a dyn PageRenderer, merger: &'a dyn DocumentMerger) -> Self {
        Self {
            renderer,
            merger,
            progress: &SilentProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Build the artifact for `section`.
    ///
    /// Pages are rendered one after another, root first and then leaves in
    /// lexicographic order. Pages already in `processed` are skipped; a page
    /// that fails to render is logged and left out. Returns
    /// [`DocsplitError::EmptyArtifact`] when no page could be rendered.
    #[instrument(skip_all, fields(url = %section.url, pages = section.page_count()))]
    pub async fn assemble(
        &self,
        section: &SectionTree,
        processed: &mut ProcessedSet,
    ) -> Result<Artifact> {
        let order = section.ordered_urls();
        let total = order.len();
        let mut local: HashSet<&CanonicalUrl> = HashSet::with_capacity(total);
        let mut pages: Vec<RenderedPage> = Vec::with_capacity(total);

        for (i, url) in order.iter().enumerate() {
            if !local.insert(url) {
                continue;
            }
            if !processed.claim(url) {
                debug!(%url, "already assembled into an earlier artifact, skipping");
                continue;
            }

            match self.renderer.render(url).await {
                Ok(page) if !page.is_empty() => {
                    processed.rendered += 1;
                    pages.push(page);
                }
                Ok(_) => {
                    warn!(%url, "render produced an empty document, skipping page");
                    processed.failed.push(url.clone());
                }
                Err(e) => {
                    warn!(%url, error = %e, "render failed, skipping page");
                    processed.failed.push(url.clone());
                }
            }
            self.progress.page_rendered(url, i + 1, total);
        }

        if pages.is_empty() {
            return Err(DocsplitError::EmptyArtifact {
                url: section.url.to_string(),
            });
        }

        let bytes = self.merger.merge(&section.url, &pages)?;
        info!(merged = pages.len(), bytes = bytes.len(), "artifact assembled");

        Ok(Artifact {
            slug: slug_for(&section.url),
            root: section.url.clone(),
            pages: pages.into_iter().map(|p| p.url).collect(),
            extension: self.merger.extension().to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use docsplit_render::MarkdownMerger;

    use super::*;

    /// Renders each page as its URL; listed pages fail or come back empty.
    #[derive(Default)]
    pub(crate) struct FakeRenderer {
        failing: HashSet<String>,
        empty: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRenderer {
        pub(crate) fn failing(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        pub(crate) fn empty(mut self, url: &str) -> Self {
            self.empty.insert(url.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageRenderer for FakeRenderer {
        async fn render(&self, url: &CanonicalUrl) -> Result<RenderedPage> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.contains(url.as_str()) {
                return Err(DocsplitError::render(url.as_str(), "HTTP 500"));
            }
            let bytes = if self.empty.contains(url.as_str()) {
                Vec::new()
            } else {
                format!("page {url}\n").into_bytes()
            };
            Ok(RenderedPage::new(url.clone(), None, bytes))
        }
    }

    fn u(path: &str) -> CanonicalUrl {
        CanonicalUrl::new(&format!("https://docs.example.com{path}"))
    }

    fn section(root: &str, leaves: &[&str]) -> SectionTree {
        SectionTree::new(u(root), leaves.iter().map(|l| u(l)).collect())
    }

    #[tokio::test]
    async fn renders_root_first_then_sorted_leaves() {
        let renderer = FakeRenderer::default();
        let assembler = Assembler::new(&renderer, &MarkdownMerger);
        let mut processed = ProcessedSet::new();

        let artifact = assembler
            .assemble(&section("/vm", &["/vm/stop", "/vm/start", "/vm/pause"]), &mut processed)
            .await
            .unwrap();

        let expected = vec![u("/vm"), u("/vm/pause"), u("/vm/start"), u("/vm/stop")];
        assert_eq!(artifact.pages, expected);
        assert_eq!(
            renderer.calls(),
            expected.iter().map(|u| u.to_string()).collect::<Vec<_>>()
        );
        assert_eq!(artifact.slug, "vm");
        assert_eq!(artifact.extension, "md");
        assert_eq!(processed.rendered(), 4);
    }

    #[tokio::test]
    async fn failed_pages_are_skipped() {
        let renderer = FakeRenderer::default()
            .failing(u("/vm/start").as_str())
            .empty(u("/vm/stop").as_str());
        let assembler = Assembler::new(&renderer, &MarkdownMerger);
        let mut processed = ProcessedSet::new();

        let artifact = assembler
            .assemble(&section("/vm", &["/vm/start", "/vm/stop", "/vm/wait"]), &mut processed)
            .await
            .unwrap();

        assert_eq!(artifact.pages, vec![u("/vm"), u("/vm/wait")]);
        assert_eq!(processed.failed(), &[u("/vm/start"), u("/vm/stop")]);
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(!text.contains("/vm/start\n"));
    }

    #[tokio::test]
    async fn all_failures_report_empty_artifact() {
        let renderer = FakeRenderer::default()
            .failing(u("/x").as_str())
            .failing(u("/x/1").as_str());
        let assembler = Assembler::new(&renderer, &MarkdownMerger);
        let mut processed = ProcessedSet::new();

        let err = assembler
            .assemble(&section("/x", &["/x/1"]), &mut processed)
            .await
            .unwrap_err();
        assert!(matches!(err, DocsplitError::EmptyArtifact { ref url } if url == u("/x").as_str()));
    }

    #[tokio::test]
    async fn global_set_renders_each_page_once() {
        let renderer = FakeRenderer::default();
        let assembler = Assembler::new(&renderer, &MarkdownMerger);
        let mut processed = ProcessedSet::new();

        let first = assembler
            .assemble(&section("/a", &["/shared", "/a/1"]), &mut processed)
            .await
            .unwrap();
        let second = assembler
            .assemble(&section("/b", &["/shared", "/b/1", "/b/1"]), &mut processed)
            .await
            .unwrap();

        assert!(first.pages.contains(&u("/shared")));
        assert_eq!(second.pages, vec![u("/b"), u("/b/1")]);
        assert_eq!(renderer.calls().iter().filter(|c| c.ends_with("/shared")).count(), 1);
        assert_eq!(processed.len(), 5);
    }

    #[tokio::test]
    async fn progress_counts_each_attempt() {
        struct Counter(Mutex<Vec<(usize, usize)>>);
        impl ProgressReporter for Counter {
            fn phase(&self, _name: &str) {}
            fn page_discovered(&self, _url: &CanonicalUrl, _visited: usize) {}
            fn page_rendered(&self, _url: &CanonicalUrl, current: usize, total: usize) {
                self.0.lock().unwrap().push((current, total));
            }
            fn artifact_written(&self, _filename: &str) {}
            fn done(&self, _report: &crate::pipeline::RunReport) {}
        }

        let renderer = FakeRenderer::default().failing(u("/p/2").as_str());
        let counter = Counter(Mutex::new(Vec::new()));
        let assembler = Assembler::new(&renderer, &MarkdownMerger).with_progress(&counter);

        assembler
            .assemble(&section("/p", &["/p/2", "/p/1"]), &mut ProcessedSet::new())
            .await
            .unwrap();

        assert_eq!(*counter.0.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }
}
