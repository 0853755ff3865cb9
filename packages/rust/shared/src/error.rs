//! Error types for docsplit.
//!
//! Library crates use [`DocsplitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docsplit operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsplitError {
    /// The caller-supplied inclusion pattern failed to compile.
    #[error("invalid URL pattern '{pattern}': {message}")]
    PatternInvalid { pattern: String, message: String },

    /// Navigation retries were exhausted for a page.
    #[error("navigation to {url} failed after {attempts} attempts: {message}{}", status_suffix(.last_status))]
    NavigationFailed {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
        last_headers: Vec<(String, String)>,
        message: String,
    },

    /// No selector in the fallback chain located a link region.
    #[error("no link region found on {url} (tried: {})", .tried.join(", "))]
    SelectorNotFound { url: String, tried: Vec<String> },

    /// A single page could not be turned into a document.
    #[error("render of {url} failed: {message}")]
    RenderFailed { url: String, message: String },

    /// Every page of a section failed to render.
    #[error("section {url} produced no pages")]
    EmptyArtifact { url: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside the retrying navigation path.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or selector error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsplitError>;

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (last status {code})"),
        None => String::new(),
    }
}

impl DocsplitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a render error for `url`.
    pub fn render(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RenderFailed {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a run can continue past this error.
    ///
    /// `NavigationFailed` is recoverable for non-root pages only; the tree
    /// builder decides based on where it happened.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NavigationFailed { .. }
                | Self::SelectorNotFound { .. }
                | Self::RenderFailed { .. }
                | Self::EmptyArtifact { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocsplitError::config("missing output dir");
        assert_eq!(err.to_string(), "config error: missing output dir");

        let err = DocsplitError::PatternInvalid {
            pattern: "(".into(),
            message: "unclosed group".into(),
        };
        assert!(err.to_string().contains("invalid URL pattern '('"));
    }

    #[test]
    fn navigation_failure_mentions_last_status() {
        let err = DocsplitError::NavigationFailed {
            url: "https://docs.example.com/a".into(),
            attempts: 5,
            last_status: Some(503),
            last_headers: vec![("retry-after".into(), "10".into())],
            message: "HTTP 503".into(),
        };
        let text = err.to_string();
        assert!(text.contains("after 5 attempts"));
        assert!(text.ends_with("(last status 503)"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(DocsplitError::render("https://x.com/a", "boom").is_recoverable());
        assert!(
            DocsplitError::EmptyArtifact {
                url: "https://x.com".into()
            }
            .is_recoverable()
        );
        assert!(
            !DocsplitError::PatternInvalid {
                pattern: "[".into(),
                message: "bad".into()
            }
            .is_recoverable()
        );
        assert!(!DocsplitError::config("x").is_recoverable());
    }
}
