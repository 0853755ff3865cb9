//! Inclusion patterns: which discovered links get followed.

use regex::Regex;

use crate::canonical::CanonicalUrl;
use crate::error::{DocsplitError, Result};

/// A compiled inclusion filter matched against canonical URLs.
///
/// Matching is a regex search over the canonical URL string, so a pattern
/// without anchors matches anywhere in the URL.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compile a caller-supplied regular expression.
    ///
    /// Returns [`DocsplitError::PatternInvalid`] instead of panicking on bad input.
    pub fn regex(pattern: &str) -> Result<Self> {
        Self::compile(pattern.to_string())
    }

    /// Match `text` literally; regex metacharacters in it have no special meaning.
    ///
    /// Escaping cannot produce invalid syntax, but the compiled program can
    /// still exceed the regex size limit for very long input.
    pub fn literal(text: &str) -> Result<Self> {
        Self::compile(regex::escape(text))
    }

    /// Match `root` itself and the URLs below it.
    ///
    /// The root must be followed by a path or query separator (or nothing), so
    /// `/guide` does not admit `/guidelines`.
    pub fn prefix(root: &CanonicalUrl) -> Result<Self> {
        Self::compile(format!("^{}(?:[/?]|$)", regex::escape(root.as_str())))
    }

    fn compile(source: String) -> Result<Self> {
        let regex = Regex::new(&source).map_err(|e| DocsplitError::PatternInvalid {
            pattern: truncated(&source),
            message: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    /// Match every URL.
    pub fn any() -> Self {
        Self {
            regex: Regex::new("").expect("empty regex"),
            source: String::new(),
        }
    }

    pub fn is_match(&self, url: &CanonicalUrl) -> bool {
        self.regex.is_match(url.as_str())
    }

    /// The regex source this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Keep error messages readable when the rejected pattern is huge.
fn truncated(source: &str) -> String {
    const MAX_CHARS: usize = 200;
    match source.char_indices().nth(MAX_CHARS) {
        Some((end, _)) => format!("{}...", &source[..end]),
        None => source.to_string(),
    }
}
