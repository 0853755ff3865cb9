//! Section splitting: partition a discovered tree into independent sections.
//!
//! A node is a section when it has children or is the tree root. Every
//! section becomes one [`SectionTree`] holding its own page plus the immediate
//! children that are not sections. Sub-sections are emitted as siblings,
//! never nested.

use std::collections::{HashMap, HashSet};

use docsplit_shared::{CanonicalUrl, SectionNode, SectionTree};

/// Partition `tree` into section trees, depth-first from the root.
///
/// Leaf references are claimed in traversal order: a leaf whose URL is some
/// section's root, or was already claimed by an earlier section, is dropped.
/// A section root met a second time folds its leaves into the first section
/// with that root. The output therefore covers every distinct URL of `tree`
/// exactly once.
pub fn split(tree: &SectionNode) -> Vec<SectionTree> {
    let section_roots: HashSet<&CanonicalUrl> = tree
        .walk()
        .into_iter()
        .filter(|node| !node.is_leaf())
        .map(|node| &node.url)
        .chain(std::iter::once(&tree.url))
        .collect();

    let mut claimed: HashSet<&CanonicalUrl> = HashSet::new();
    let mut emitted: HashMap<&CanonicalUrl, usize> = HashMap::new();
    let mut sections: Vec<SectionTree> = Vec::new();
    let mut stack = vec![tree];

    while let Some(section) = stack.pop() {
        let leaves: Vec<CanonicalUrl> = section
            .children
            .iter()
            .filter(|child| child.is_leaf() && !section_roots.contains(&child.url))
            .filter(|child| claimed.insert(&child.url))
            .map(|child| child.url.clone())
            .collect();

        match emitted.get(&section.url) {
            Some(&index) => sections[index].leaves.extend(leaves),
            None => {
                emitted.insert(&section.url, sections.len());
                sections.push(SectionTree::new(section.url.clone(), leaves));
            }
        }

        stack.extend(section.children.iter().filter(|c| !c.is_leaf()).rev());
    }

    sections
}

/// Collapse `tree` into a single section rooted at its root page.
///
/// Leaves are every other distinct URL, in pre-order of first appearance.
pub fn flatten(tree: &SectionNode) -> SectionTree {
    let mut seen: HashSet<&CanonicalUrl> = HashSet::from([&tree.url]);
    let leaves = tree
        .walk()
        .into_iter()
        .filter(|node| seen.insert(&node.url))
        .map(|node| node.url.clone())
        .collect();
    SectionTree::new(tree.url.clone(), leaves)
}

/// Split or flatten depending on `split_sections`.
pub fn partition(tree: &SectionNode, split_sections: bool) -> Vec<SectionTree> {
    if split_sections {
        split(tree)
    } else {
        vec![flatten(tree)]
    }
}
