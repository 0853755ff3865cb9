//! HTML to Markdown conversion for a single page.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use docsplit_shared::{DocsplitError, Result};

/// Content regions tried, in order, after the configured one.
pub const FALLBACK_REGIONS: &[&str] = &["main", "article", "[role=\"main\"]", "body"];

/// Elements dropped from the converted output.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "iframe", "noscript", "svg",
];

/// Markdown body and title of one converted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub title: Option<String>,
    pub markdown: String,
}

/// Convert the content region of `html` to Markdown.
///
/// Relative link targets are resolved against `base`. The output is empty
/// when the page has no textual content.
pub fn html_to_markdown(html: &str, base: &Url, content_selector: Option<&str>) -> Result<Converted> {
    let doc = Html::parse_document(html);
    let title = page_title(&doc);
    let region = content_region(&doc, content_selector).unwrap_or_else(|| html.to_string());

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();
    let raw = converter
        .convert(&region)
        .map_err(|e| DocsplitError::Conversion(format!("htmd conversion failed: {e}")))?;

    let markdown = tidy(&raw, base);
    debug!(url = %base, raw_len = raw.len(), len = markdown.len(), "page converted");

    Ok(Converted { title, markdown })
}

fn content_region(doc: &Html, preferred: Option<&str>) -> Option<String> {
    preferred
        .into_iter()
        .chain(FALLBACK_REGIONS.iter().copied())
        .find_map(|sel| {
            let selector = Selector::parse(sel).ok()?;
            doc.select(&selector).next().map(|el| el.inner_html())
        })
}

/// First non-empty `<h1>`, else `<title>`.
fn page_title(doc: &Html) -> Option<String> {
    ["h1", "title"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        doc.select(&selector)
            .map(|el| el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
            .find(|text| !text.is_empty())
    })
}

fn tidy(md: &str, base: &Url) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\]\(([^)\s]+)\)").expect("valid regex"));
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let linked = LINK_RE.replace_all(md, |caps: &Captures| {
        let target = &caps[1];
        if target.starts_with('#') || Url::parse(target).is_ok() {
            return caps[0].to_string();
        }
        match base.join(target) {
            Ok(resolved) => format!("]({resolved})"),
            Err(_) => caps[0].to_string(),
        }
    });

    let trimmed_lines: String = linked
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let collapsed = BLANK_RUN_RE.replace_all(&trimmed_lines, "\n\n");

    let body = collapsed.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://docs.example.com/guide/intro").unwrap()
    }

    #[test]
    fn converts_content_region_only() {
        let html = r#"<html><head><title>Ignored</title></head><body>
            <nav><a href="/x">Nav link</a></nav>
            <main><h1>Getting Started</h1><p>Install the tool.</p></main>
            <footer>Copyright</footer>
        </body></html>"#;

        let out = html_to_markdown(html, &base(), None).unwrap();
        assert_eq!(out.title.as_deref(), Some("Getting Started"));
        assert!(out.markdown.contains("# Getting Started"));
        assert!(out.markdown.contains("Install the tool."));
        assert!(!out.markdown.contains("Nav link"));
        assert!(!out.markdown.contains("Copyright"));
        assert!(out.markdown.ends_with('\n'));
    }

    #[test]
    fn configured_selector_wins_over_fallbacks() {
        let html = r#"<body>
            <main><p>Main text</p></main>
            <div class="doc"><p>Doc text</p></div>
        </body>"#;

        let out = html_to_markdown(html, &base(), Some(".doc")).unwrap();
        assert!(out.markdown.contains("Doc text"));
        assert!(!out.markdown.contains("Main text"));
    }

    #[test]
    fn missing_selector_falls_back_to_body() {
        let html = "<body><p>Only body</p></body>";
        let out = html_to_markdown(html, &base(), Some("#content")).unwrap();
        assert!(out.markdown.contains("Only body"));
    }

    #[test]
    fn title_falls_back_to_title_element() {
        let html = "<html><head><title> Page  Title </title></head><body><p>x</p></body></html>";
        let out = html_to_markdown(html, &base(), None).unwrap();
        assert_eq!(out.title.as_deref(), Some("Page Title"));
    }

    #[test]
    fn empty_page_yields_empty_markdown() {
        let out = html_to_markdown("<body><main>  </main></body>", &base(), None).unwrap();
        assert!(out.markdown.is_empty());
    }

    #[test]
    fn tidy_resolves_relative_links() {
        let md = "See [setup](setup) and [api](/api/) and [top](#top) and [ext](https://x.org/a).";
        let out = tidy(md, &base());
        assert!(out.contains("[setup](https://docs.example.com/guide/setup)"));
        assert!(out.contains("[api](https://docs.example.com/api/)"));
        assert!(out.contains("[top](#top)"));
        assert!(out.contains("[ext](https://x.org/a)"));
    }

    #[test]
    fn tidy_collapses_blank_runs_and_trailing_space() {
        let out = tidy("a   \n\n\n\n\nb\n\n\n", &base());
        assert_eq!(out, "a\n\nb\n");
    }
}
