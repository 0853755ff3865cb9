//! The persistence capability the pipeline writes artifacts through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docsplit_shared::{Artifact, CanonicalUrl, Result, RunId, SkippedSection};

/// Where and how one artifact was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedArtifact {
    /// Slug after collision handling; may differ from [`Artifact::slug`].
    pub slug: String,
    pub filename: String,
    pub root: CanonicalUrl,
    pub pages: Vec<CanonicalUrl>,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Run-level facts recorded when a sink is finished.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub main_url: CanonicalUrl,
    pub split_sections: bool,
    pub started_at: DateTime<Utc>,
    pub skipped: Vec<SkippedSection>,
}

/// Stores artifacts as they are produced.
pub trait ArtifactSink: Send {
    fn persist(&mut self, artifact: &Artifact) -> Result<PersistedArtifact>;

    /// Called once after the last artifact.
    fn finish(&mut self, summary: &RunSummary) -> Result<()>;
}
