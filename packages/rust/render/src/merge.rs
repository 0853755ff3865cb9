//! Merge rendered Markdown pages into one section document.

use docsplit_shared::{CanonicalUrl, Result};

use crate::renderer::{DocumentMerger, RenderedPage};

const PAGE_SEPARATOR: &str = "\n---\n\n";

/// Concatenates Markdown pages under a YAML header and a contents list.
///
/// Pages keep the order they were given in; each is preceded by a
/// `<!-- source: ... -->` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownMerger;

impl DocumentMerger for MarkdownMerger {
    fn extension(&self) -> &str {
        "md"
    }

    fn merge(&self, root: &CanonicalUrl, pages: &[RenderedPage]) -> Result<Vec<u8>> {
        let mut out = String::new();
        out.push_str("---\n");
        out.push_str(&format!("source_root: \"{}\"\n", escape_yaml(root.as_str())));
        out.push_str(&format!("pages: {}\n", pages.len()));
        out.push_str("---\n\n");

        if pages.len() > 1 {
            out.push_str("## Contents\n\n");
            for page in pages {
                let label = page.title.as_deref().unwrap_or(page.url.as_str());
                out.push_str(&format!("- [{label}]({})\n", page.url));
            }
            out.push('\n');
        }

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                out.push_str(PAGE_SEPARATOR);
            }
            out.push_str(&format!("<!-- source: {} -->\n\n", page.url));
            let body = String::from_utf8_lossy(&page.bytes);
            out.push_str(body.trim_end());
            out.push('\n');
        }

        Ok(out.into_bytes())
    }
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: Option<&str>, body: &str) -> RenderedPage {
        RenderedPage::new(
            CanonicalUrl::new(url),
            title.map(str::to_string),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn merges_in_given_order() {
        let root = CanonicalUrl::new("https://docs.example.com/vm");
        let pages = vec![
            page("https://docs.example.com/vm", Some("VM"), "# VM\n\nOverview\n"),
            page("https://docs.example.com/vm/start()", None, "# start()\n"),
        ];

        let text = String::from_utf8(MarkdownMerger.merge(&root, &pages).unwrap()).unwrap();

        assert!(text.starts_with("---\nsource_root: \"https://docs.example.com/vm\"\npages: 2\n---\n"));
        assert!(text.contains("- [VM](https://docs.example.com/vm)"));
        assert!(text.contains("- [https://docs.example.com/vm/start()](https://docs.example.com/vm/start())"));

        let first = text.find("# VM").unwrap();
        let second = text.find("# start()").unwrap();
        assert!(first < second);
        assert_eq!(text.matches("<!-- source:").count(), 2);
        assert_eq!(text.matches("\n---\n\n<!-- source:").count(), 1);
    }

    #[test]
    fn single_page_has_no_contents_list() {
        let root = CanonicalUrl::new("https://docs.example.com/faq");
        let pages = vec![page("https://docs.example.com/faq", Some("FAQ"), "Q and A")];

        let text = String::from_utf8(MarkdownMerger.merge(&root, &pages).unwrap()).unwrap();
        assert!(!text.contains("## Contents"));
        assert!(text.ends_with("Q and A\n"));
        assert_eq!(MarkdownMerger.extension(), "md");
    }
}
