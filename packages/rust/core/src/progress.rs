//! Progress reporting for long-running runs.

use docsplit_crawler::CrawlProgress;
use docsplit_shared::CanonicalUrl;

use crate::pipeline::RunReport;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the tree builder expands a page.
    fn page_discovered(&self, url: &CanonicalUrl, visited: usize);
    /// Called after each render attempt within a section.
    fn page_rendered(&self, url: &CanonicalUrl, current: usize, total: usize);
    /// Called when an artifact file has been written.
    fn artifact_written(&self, filename: &str);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_discovered(&self, _url: &CanonicalUrl, _visited: usize) {}
    fn page_rendered(&self, _url: &CanonicalUrl, _current: usize, _total: usize) {}
    fn artifact_written(&self, _filename: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// Forwards tree-builder events to a [`ProgressReporter`].
pub(crate) struct DiscoveryProgress<'a>(pub &'a dyn ProgressReporter);

impl CrawlProgress for DiscoveryProgress<'_> {
    fn page_discovered(&self, url: &CanonicalUrl, visited: usize) {
        self.0.page_discovered(url, visited);
    }
}
