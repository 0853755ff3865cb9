//! Page rendering and document merging.
//!
//! This crate provides:
//! - [`PageRenderer`] / [`DocumentMerger`]: the capabilities the assembler drives
//! - [`MarkdownRenderer`]: HTTP fetch plus HTML to Markdown conversion via `htmd`
//! - [`MarkdownMerger`]: concatenation of rendered pages into one Markdown file

pub mod http;
pub mod markdown;
pub mod merge;
pub mod renderer;

pub use http::MarkdownRenderer;
pub use markdown::{Converted, FALLBACK_REGIONS, html_to_markdown};
pub use merge::MarkdownMerger;
pub use renderer::{DocumentMerger, PageRenderer, RenderedPage};
