//! `manifest.json`: the record of one run's output directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docsplit_shared::{CanonicalUrl, DocsplitError, Result, RunId, SkippedSection};

use crate::sink::PersistedArtifact;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub run_id: RunId,
    pub main_url: CanonicalUrl,
    pub tool_version: String,
    pub split_sections: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub artifacts: Vec<PersistedArtifact>,
    #[serde(default)]
    pub skipped: Vec<SkippedSection>,
}

impl Manifest {
    /// Total pages across all artifacts.
    pub fn page_count(&self) -> usize {
        self.artifacts.iter().map(|a| a.pages.len()).sum()
    }
}

/// Read and validate `manifest.json` from `dir`.
pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| DocsplitError::io(&path, e))?;
    let manifest: Manifest = serde_json::from_str(&content)
        .map_err(|e| DocsplitError::validation(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(DocsplitError::validation(format!(
            "unsupported manifest schema version {} (expected {CURRENT_SCHEMA_VERSION})",
            manifest.schema_version
        )));
    }

    Ok(manifest)
}
