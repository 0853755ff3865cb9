//! End-to-end run: main URL → section tree → sections → artifacts.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use docsplit_artifacts::{ArtifactSink, PersistedArtifact, RunSummary};
use docsplit_crawler::{FetchStep, TreeBuilder};
use docsplit_render::{DocumentMerger, PageRenderer};
use docsplit_shared::{
    CanonicalUrl, Result, RunId, SectionNode, SkippedSection, UrlPattern, canonicalize,
};

use crate::assembler::{Assembler, ProcessedSet};
use crate::progress::{DiscoveryProgress, ProgressReporter, SilentProgress};
use crate::split::partition;

/// What to crawl and how to cut it up.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub main_url: String,
    /// Inclusion filter. `None` follows only pages below `main_url`.
    pub url_pattern: Option<String>,
    /// Match `url_pattern` as plain text instead of a regex.
    pub literal_pattern: bool,
    /// One artifact per section instead of one for the whole tree.
    pub split_sections: bool,
}

impl RunConfig {
    pub fn new(main_url: impl Into<String>) -> Self {
        Self {
            main_url: main_url.into(),
            url_pattern: None,
            literal_pattern: false,
            split_sections: false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub main_url: CanonicalUrl,
    pub artifacts: Vec<PersistedArtifact>,
    pub skipped: Vec<SkippedSection>,
    pub rendered_pages: usize,
    pub failed_pages: Vec<CanonicalUrl>,
    pub elapsed: Duration,
}

/// Compile the inclusion pattern for a run, before any network activity.
pub fn resolve_pattern(main_url: &CanonicalUrl, config: &RunConfig) -> Result<UrlPattern> {
    match config.url_pattern.as_deref() {
        None => UrlPattern::prefix(main_url),
        Some(text) if config.literal_pattern => UrlPattern::literal(text),
        Some(pattern) => UrlPattern::regex(pattern),
    }
}

/// Build the section tree for `config` without rendering anything.
#[instrument(skip_all, fields(url = %config.main_url))]
pub async fn discover(
    fetch: &FetchStep,
    config: &RunConfig,
    progress: &dyn ProgressReporter,
) -> Result<SectionNode> {
    let main_url = canonicalize(&config.main_url);
    let pattern = resolve_pattern(&main_url, config)?;

    progress.phase("Discovering pages");
    let crawl_progress = DiscoveryProgress(progress);
    TreeBuilder::new(fetch)
        .with_progress(&crawl_progress)
        .build(main_url.as_str(), &pattern)
        .await
}

/// Drives discovery, splitting, assembly and persistence.
pub struct Pipeline<'a> {
    fetch: &'a FetchStep,
    renderer: &'a dyn PageRenderer,
    merger: &'a dyn DocumentMerger,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        fetch: &'a FetchStep,
        renderer: &'a dyn PageRenderer,
        merger: &'a dyn DocumentMerger,
    ) -> Self {
        Self {
            fetch,
            renderer,
            merger,
            progress: &SilentProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Run the whole pipeline, writing artifacts to `sink`.
    ///
    /// 1. Compile the pattern and build the section tree
    /// 2. Split (or flatten) the tree into sections
    /// 3. Assemble each section in order, sharing one processed set
    /// 4. Persist each artifact and finish the sink
    ///
    /// Sections that produce nothing are recorded as skipped. Invalid
    /// patterns, root navigation failures and sink errors end the run.
    #[instrument(skip_all, fields(url = %config.main_url, split = config.split_sections))]
    pub async fn run(&self, config: &RunConfig, sink: &mut dyn ArtifactSink) -> Result<RunReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = RunId::new();
        let main_url = canonicalize(&config.main_url);

        info!(%run_id, url = %main_url, "starting run");

        // --- Phase 1: Discovery ---
        let tree = discover(self.fetch, config, self.progress).await?;

        // --- Phase 2: Split ---
        self.progress.phase("Splitting sections");
        let sections = partition(&tree, config.split_sections);
        info!(
            pages = tree.urls().len(),
            sections = sections.len(),
            "tree partitioned"
        );

        // --- Phase 3: Assemble + persist ---
        self.progress.phase("Rendering sections");
        let assembler = Assembler::new(self.renderer, self.merger).with_progress(self.progress);
        let mut processed = ProcessedSet::new();
        let mut artifacts = Vec::with_capacity(sections.len());
        let mut skipped = Vec::new();

        for section in &sections {
            match assembler.assemble(section, &mut processed).await {
                Ok(artifact) => {
                    let persisted = sink.persist(&artifact)?;
                    self.progress.artifact_written(&persisted.filename);
                    artifacts.push(persisted);
                }
                Err(e) if e.is_recoverable() => {
                    warn!(url = %section.url, error = %e, "skipping section");
                    skipped.push(SkippedSection::new(section.url.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        // --- Phase 4: Finish ---
        sink.finish(&RunSummary {
            run_id: run_id.clone(),
            main_url: main_url.clone(),
            split_sections: config.split_sections,
            started_at,
            skipped: skipped.clone(),
        })?;

        let report = RunReport {
            run_id,
            main_url,
            artifacts,
            skipped,
            rendered_pages: processed.rendered(),
            failed_pages: processed.failed().to_vec(),
            elapsed: start.elapsed(),
        };

        self.progress.done(&report);

        info!(
            run_id = %report.run_id,
            artifacts = report.artifacts.len(),
            skipped = report.skipped.len(),
            rendered = report.rendered_pages,
            failed = report.failed_pages.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "run complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docsplit_artifacts::{FsArtifactStore, read_manifest};
    use docsplit_crawler::BrowserGate;
    use docsplit_crawler::testing::{ScriptedBrowser, fast_config};
    use docsplit_render::MarkdownMerger;
    use docsplit_shared::{Artifact, DocsplitError};

    use super::*;
    use crate::assembler::tests::FakeRenderer;

    const ROOT: &str = "https://developer.apple.com/documentation/virtualization";

    fn u(path: &str) -> String {
        format!("{ROOT}{path}")
    }

    /// Keeps artifacts in memory.
    #[derive(Default)]
    struct MemorySink {
        artifacts: Vec<Artifact>,
        finished: Option<RunSummary>,
    }

    impl ArtifactSink for MemorySink {
        fn persist(&mut self, artifact: &Artifact) -> Result<PersistedArtifact> {
            self.artifacts.push(artifact.clone());
            Ok(PersistedArtifact {
                slug: artifact.slug.clone(),
                filename: format!("{}.{}", artifact.slug, artifact.extension),
                root: artifact.root.clone(),
                pages: artifact.pages.clone(),
                size_bytes: artifact.bytes.len(),
                sha256: String::new(),
            })
        }

        fn finish(&mut self, summary: &RunSummary) -> Result<()> {
            self.finished = Some(summary.clone());
            Ok(())
        }
    }

    fn virtualization_site() -> ScriptedBrowser {
        ScriptedBrowser::new()
            .page(ROOT, &[&u("/vzvirtualmachine"), "https://developer.apple.com/news"])
            .page(
                &u("/vzvirtualmachine"),
                &[&u("/vzvirtualmachine/start()"), &u("/vzvirtualmachine/state-swift.enum"), ROOT],
            )
            .page(&u("/vzvirtualmachine/start()"), &[])
            .page(
                &u("/vzvirtualmachine/state-swift.enum"),
                &[&u("/vzvirtualmachine/state-swift.enum/stopped")],
            )
            .page(&u("/vzvirtualmachine/state-swift.enum/stopped"), &[])
    }

    fn fetch_step(browser: ScriptedBrowser) -> (Arc<ScriptedBrowser>, FetchStep) {
        let browser = Arc::new(browser);
        let step = FetchStep::new(browser.clone(), BrowserGate::new(), &fast_config());
        (browser, step)
    }

    fn split_config() -> RunConfig {
        RunConfig {
            split_sections: true,
            ..RunConfig::new(ROOT)
        }
    }

    #[tokio::test]
    async fn split_run_writes_one_artifact_per_section() {
        let (browser, step) = fetch_step(virtualization_site());
        let renderer = FakeRenderer::default();
        let mut sink = MemorySink::default();

        let report = Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&split_config(), &mut sink)
            .await
            .unwrap();

        let roots: Vec<&str> = sink.artifacts.iter().map(|a| a.root.as_str()).collect();
        assert_eq!(
            roots,
            vec![
                ROOT.to_string(),
                u("/vzvirtualmachine"),
                u("/vzvirtualmachine/state-swift.enum"),
            ]
        );
        assert_eq!(sink.artifacts[0].pages.len(), 1);
        assert_eq!(
            sink.artifacts[1].pages,
            vec![
                CanonicalUrl::new(&u("/vzvirtualmachine")),
                CanonicalUrl::new(&u("/vzvirtualmachine/start()")),
            ]
        );
        assert_eq!(report.rendered_pages, 5);
        assert!(report.skipped.is_empty());
        assert!(report.failed_pages.is_empty());
        assert!(!browser.navigated().iter().any(|n| n.ends_with("/news")));

        let summary = sink.finished.unwrap();
        assert_eq!(summary.run_id, report.run_id);
        assert!(summary.split_sections);
    }

    #[tokio::test]
    async fn unsplit_run_merges_everything_into_one_artifact() {
        let (_, step) = fetch_step(virtualization_site());
        let renderer = FakeRenderer::default();
        let mut sink = MemorySink::default();

        Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&RunConfig::new(ROOT), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.artifacts.len(), 1);
        let pages = &sink.artifacts[0].pages;
        assert_eq!(pages.len(), 5);
        assert_eq!(pages[0].as_str(), ROOT);
        let mut rest = pages[1..].to_vec();
        rest.sort();
        assert_eq!(rest, pages[1..]);
    }

    #[tokio::test]
    async fn invalid_pattern_fails_before_navigation() {
        let (browser, step) = fetch_step(virtualization_site());
        let renderer = FakeRenderer::default();
        let mut sink = MemorySink::default();
        let config = RunConfig {
            url_pattern: Some("https://x.com/a/(".into()),
            ..RunConfig::new(ROOT)
        };

        let err = Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&config, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DocsplitError::PatternInvalid { .. }));
        assert!(browser.navigated().is_empty());
        assert!(sink.finished.is_none());
    }

    #[test]
    fn literal_patterns_escape_metacharacters() {
        let main = CanonicalUrl::new(ROOT);
        let config = RunConfig {
            url_pattern: Some("https://x.com/a/.*(".into()),
            literal_pattern: true,
            ..RunConfig::new(ROOT)
        };

        let pattern = resolve_pattern(&main, &config).unwrap();
        assert!(pattern.is_match(&CanonicalUrl::new("https://x.com/a/.*(")));
        assert!(!pattern.is_match(&CanonicalUrl::new("https://x.com/a/b")));

        let default = resolve_pattern(&main, &RunConfig::new(ROOT)).unwrap();
        assert!(default.is_match(&CanonicalUrl::new(&u("/vzvirtualmachine"))));
        assert!(!default.is_match(&CanonicalUrl::new("https://developer.apple.com/news")));
        assert!(!default.is_match(&CanonicalUrl::new(&format!("{ROOT}-legacy"))));
    }

    #[tokio::test]
    async fn oversized_literal_pattern_fails_before_navigation() {
        let (browser, step) = fetch_step(virtualization_site());
        let config = RunConfig {
            url_pattern: Some("a.".repeat(1 << 20)),
            literal_pattern: true,
            ..RunConfig::new(ROOT)
        };

        let err = discover(&step, &config, &SilentProgress).await.unwrap_err();

        assert!(matches!(err, DocsplitError::PatternInvalid { .. }));
        assert!(browser.navigated().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn root_failure_aborts_the_run() {
        let (_, step) = fetch_step(virtualization_site().failing_first(ROOT, 5));
        let renderer = FakeRenderer::default();
        let mut sink = MemorySink::default();

        let err = Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&split_config(), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DocsplitError::NavigationFailed { attempts: 5, .. }));
        assert!(renderer.calls().is_empty());
        assert!(sink.finished.is_none());
    }

    #[tokio::test]
    async fn unrenderable_section_is_skipped() {
        let (_, step) = fetch_step(virtualization_site());
        let renderer = FakeRenderer::default()
            .failing(&u("/vzvirtualmachine/state-swift.enum"))
            .failing(&u("/vzvirtualmachine/state-swift.enum/stopped"))
            .empty(&u("/vzvirtualmachine/start()"));
        let mut sink = MemorySink::default();

        let report = Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&split_config(), &mut sink)
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].url.as_str(), u("/vzvirtualmachine/state-swift.enum"));
        assert_eq!(report.failed_pages.len(), 3);
        assert_eq!(report.rendered_pages, 2);
        assert_eq!(sink.finished.unwrap().skipped, report.skipped);
    }

    #[tokio::test]
    async fn writes_files_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let (_, step) = fetch_step(virtualization_site());
        let renderer = FakeRenderer::default();
        let mut store = FsArtifactStore::new(dir.path()).unwrap();

        let report = Pipeline::new(&step, &renderer, &MarkdownMerger)
            .run(&split_config(), &mut store)
            .await
            .unwrap();

        let manifest = read_manifest(dir.path()).unwrap();
        assert_eq!(manifest.run_id, report.run_id);
        assert_eq!(manifest.artifacts.len(), 3);
        assert_eq!(manifest.page_count(), 5);
        for artifact in &manifest.artifacts {
            assert!(dir.path().join(&artifact.filename).exists());
        }
        assert_eq!(
            manifest.artifacts[1].filename,
            "documentation-virtualization-vzvirtualmachine.md"
        );
    }

    #[tokio::test]
    async fn discover_returns_tree_without_rendering() {
        let (_, step) = fetch_step(virtualization_site());

        let tree = discover(&step, &RunConfig::new(ROOT), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(tree.urls().len(), 5);
    }
}
