//! Artifact persistence for docsplit.
//!
//! Provides the [`ArtifactSink`] capability and [`FsArtifactStore`], which
//! writes each merged section document atomically and records the run in
//! `manifest.json` with SHA-256 checksums.

pub mod manifest;
pub mod sink;
pub mod store;

pub use manifest::{CURRENT_SCHEMA_VERSION, MANIFEST_FILE, Manifest, read_manifest};
pub use sink::{ArtifactSink, PersistedArtifact, RunSummary};
pub use store::FsArtifactStore;
