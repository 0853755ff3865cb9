//! Filesystem [`ArtifactSink`].
//!
//! Layout of an output directory:
//!
//! ```text
//! <out_dir>/
//! ├── manifest.json
//! ├── <slug>.md
//! └── <slug>-2.md   (slug collision within one run)
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use docsplit_shared::{Artifact, DocsplitError, Result};

use crate::manifest::{CURRENT_SCHEMA_VERSION, MANIFEST_FILE, Manifest};
use crate::sink::{ArtifactSink, PersistedArtifact, RunSummary};

/// Writes each artifact to `<out_dir>/<slug>.<ext>` and a manifest at the end.
#[derive(Debug)]
pub struct FsArtifactStore {
    out_dir: PathBuf,
    used_slugs: HashSet<String>,
    written: Vec<PersistedArtifact>,
}

impl FsArtifactStore {
    /// Open `out_dir`, creating it if needed.
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir).map_err(|e| DocsplitError::io(&out_dir, e))?;
        Ok(Self {
            out_dir,
            used_slugs: HashSet::new(),
            written: Vec::new(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Artifacts persisted so far, in write order.
    pub fn written(&self) -> &[PersistedArtifact] {
        &self.written
    }

    fn claim_slug(&mut self, base: &str) -> String {
        let mut slug = base.to_string();
        let mut n = 2;
        while !self.used_slugs.insert(slug.clone()) {
            slug = format!("{base}-{n}");
            n += 1;
        }
        slug
    }
}

impl ArtifactSink for FsArtifactStore {
    #[instrument(skip_all, fields(slug = %artifact.slug, root = %artifact.root))]
    fn persist(&mut self, artifact: &Artifact) -> Result<PersistedArtifact> {
        let slug = self.claim_slug(&artifact.slug);
        let filename = format!("{slug}.{}", artifact.extension);
        write_atomic(&self.out_dir.join(&filename), &artifact.bytes)?;

        let persisted = PersistedArtifact {
            slug,
            filename,
            root: artifact.root.clone(),
            pages: artifact.pages.clone(),
            size_bytes: artifact.bytes.len(),
            sha256: sha256_hex(&artifact.bytes),
        };
        debug!(file = %persisted.filename, size = persisted.size_bytes, "wrote artifact");

        self.written.push(persisted.clone());
        Ok(persisted)
    }

    #[instrument(skip_all, fields(run_id = %summary.run_id))]
    fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        let manifest = Manifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: summary.run_id.clone(),
            main_url: summary.main_url.clone(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            split_sections: summary.split_sections,
            started_at: summary.started_at,
            finished_at: Utc::now(),
            artifacts: self.written.clone(),
            skipped: summary.skipped.clone(),
        };

        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| DocsplitError::validation(format!("JSON serialization failed: {e}")))?;
        write_atomic(&self.out_dir.join(MANIFEST_FILE), &json)?;

        info!(
            artifacts = manifest.artifacts.len(),
            skipped = manifest.skipped.len(),
            out_dir = %self.out_dir.display(),
            "manifest written"
        );
        Ok(())
    }
}

/// Write to a dot-prefixed temp file beside `target`, then rename over it.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| DocsplitError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| DocsplitError::io(target, e))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
