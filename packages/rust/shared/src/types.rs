//! Core domain types: the discovered page tree, its split sections, and artifacts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::CanonicalUrl;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one docsplit run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SectionNode
// ---------------------------------------------------------------------------

/// One discovered page and the pages discovered from it.
///
/// Children are owned exclusively by their parent. The same canonical URL may
/// appear more than once in a tree (as a childless reference), but is expanded
/// at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionNode {
    pub url: CanonicalUrl,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    /// A node with no children.
    pub fn leaf(url: CanonicalUrl) -> Self {
        Self {
            url,
            children: Vec::new(),
        }
    }

    pub fn with_children(url: CanonicalUrl, children: Vec<SectionNode>) -> Self {
        Self { url, children }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes, references included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SectionNode::node_count).sum::<usize>()
    }

    /// Distinct canonical URLs anywhere in the tree.
    pub fn urls(&self) -> HashSet<CanonicalUrl> {
        let mut out = HashSet::new();
        self.collect_urls(&mut out);
        out
    }

    fn collect_urls(&self, out: &mut HashSet<CanonicalUrl>) {
        out.insert(self.url.clone());
        for child in &self.children {
            child.collect_urls(out);
        }
    }

    /// Pre-order traversal (node before its children, children in order).
    pub fn walk(&self) -> Vec<&SectionNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// SectionTree
// ---------------------------------------------------------------------------

/// One section after splitting: its root page plus its directly-owned leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTree {
    pub url: CanonicalUrl,
    #[serde(default)]
    pub leaves: Vec<CanonicalUrl>,
}

impl SectionTree {
    pub fn new(url: CanonicalUrl, leaves: Vec<CanonicalUrl>) -> Self {
        Self { url, leaves }
    }

    /// Render order: root first, then leaves lexicographically.
    pub fn ordered_urls(&self) -> Vec<CanonicalUrl> {
        let mut leaves = self.leaves.clone();
        leaves.sort();
        let mut out = Vec::with_capacity(leaves.len() + 1);
        out.push(self.url.clone());
        out.extend(leaves);
        out
    }

    /// Number of pages this section covers, root included.
    pub fn page_count(&self) -> usize {
        1 + self.leaves.len()
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A merged, multi-page document for one section.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// File-name stem derived from the root URL.
    pub slug: String,
    /// The section's root page.
    pub root: CanonicalUrl,
    /// Pages actually merged, in merge order.
    pub pages: Vec<CanonicalUrl>,
    /// File extension of the merged document, without the dot.
    pub extension: String,
    /// The merged document.
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// SkippedSection
// ---------------------------------------------------------------------------

/// A section that produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSection {
    pub url: CanonicalUrl,
    pub reason: String,
}

impl SkippedSection {
    pub fn new(url: CanonicalUrl, reason: impl Into<String>) -> Self {
        Self {
            url,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Derive an artifact slug from a page URL.
///
/// Path segments are lowercased, reduced to alphanumerics and `-`, and joined
/// with `-`. The site root becomes `index`.
pub fn slug_for(url: &CanonicalUrl) -> String {
    let path = match url.to_url() {
        Some(parsed) => parsed.path().to_string(),
        None => url.as_str().to_string(),
    };

    let slug = path
        .trim_matches('/')
        .trim_end_matches(".html")
        .trim_end_matches(".htm")
        .split('/')
        .map(|segment| {
            segment
                .to_lowercase()
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '-' })
                .collect::<String>()
        })
        .flat_map(|segment| {
            segment
                .split('-')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug
    }
}
