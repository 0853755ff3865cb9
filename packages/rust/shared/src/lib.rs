//! Shared types, error model, and configuration for docsplit.
//!
//! This crate is the foundation depended on by all other docsplit crates.
//! It provides:
//! - [`DocsplitError`]: the unified error type
//! - URL identity ([`CanonicalUrl`], [`canonicalize`]) and inclusion filters ([`UrlPattern`])
//! - Domain types ([`SectionNode`], [`SectionTree`], [`Artifact`], [`RunId`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod canonical;
pub mod config;
pub mod error;
pub mod pattern;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use canonical::{CanonicalUrl, canonicalize};
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, FetchConfig, RenderConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DocsplitError, Result};
pub use pattern::UrlPattern;
pub use types::{Artifact, RunId, SectionNode, SectionTree, SkippedSection, slug_for};
