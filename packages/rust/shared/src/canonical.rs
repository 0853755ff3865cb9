//! URL canonicalization.
//!
//! Every identity comparison in docsplit goes through [`canonicalize`]:
//! the fragment is dropped, trailing `/` characters are stripped from the
//! path, and everything else (scheme, host, other path segments, query) is
//! kept. Canonicalization never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// The identity form of a page URL.
///
/// Two URLs name the same page iff their `CanonicalUrl`s are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Canonicalize `raw`. Same as [`canonicalize`].
    pub fn new(raw: &str) -> Self {
        canonicalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a [`Url`], if the canonical form is a valid absolute URL.
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    /// Resolve a possibly-relative `href` found on this page and canonicalize it.
    ///
    /// Returns `None` for fragment-only, `javascript:`, `mailto:` and `tel:`
    /// links, and for hrefs that cannot be resolved.
    pub fn join(&self, href: &str) -> Option<CanonicalUrl> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return None;
        }

        if let Ok(absolute) = Url::parse(href) {
            return Some(canonicalize(absolute.as_str()));
        }

        let base = self.to_url()?;
        base.join(href).ok().map(|u| canonicalize(u.as_str()))
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalUrl {
    fn from(raw: &str) -> Self {
        canonicalize(raw)
    }
}

impl From<&Url> for CanonicalUrl {
    fn from(url: &Url) -> Self {
        canonicalize(url.as_str())
    }
}

/// Map any URL string to its canonical identity.
///
/// Parseable URLs go through [`Url`] (which normalizes scheme/host case and
/// percent-encoding); anything else gets the same fragment and trailing
/// separator strip at the string level.
pub fn canonicalize(raw: &str) -> CanonicalUrl {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            CanonicalUrl(strip_trailing_separators(url.as_str()))
        }
        Err(_) => {
            let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);
            CanonicalUrl(strip_trailing_separators(without_fragment))
        }
    }
}

/// Strip trailing `/` from the part before the query string.
fn strip_trailing_separators(s: &str) -> String {
    match s.split_once('?') {
        Some((head, query)) => format!("{}?{query}", head.trim_end_matches('/')),
        None => s.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_fragment_and_trailing_slash() {
        assert_eq!(
            canonicalize("https://docs.example.com/guide/intro/#setup").as_str(),
            "https://docs.example.com/guide/intro"
        );
        assert_eq!(
            canonicalize("https://docs.example.com/guide///").as_str(),
            "https://docs.example.com/guide"
        );
    }

    #[test]
    fn keeps_query_and_inner_segments() {
        assert_eq!(
            canonicalize("https://docs.example.com/a/b/?lang=swift#x").as_str(),
            "https://docs.example.com/a/b?lang=swift"
        );
        assert_eq!(
            canonicalize("https://docs.example.com/a//b").as_str(),
            "https://docs.example.com/a//b"
        );
    }

    #[test]
    fn site_root_loses_its_slash() {
        assert_eq!(
            canonicalize("https://docs.example.com/").as_str(),
            "https://docs.example.com"
        );
        assert_eq!(
            canonicalize("https://docs.example.com").as_str(),
            "https://docs.example.com"
        );
    }

    #[test]
    fn malformed_input_falls_back_to_string_strip() {
        assert_eq!(canonicalize("not a url/#frag").as_str(), "not a url");
        assert_eq!(canonicalize("relative/path/?q=1").as_str(), "relative/path?q=1");
        assert_eq!(canonicalize("").as_str(), "");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let inputs = [
            "https://docs.example.com/",
            "https://docs.example.com/a/?q=1#f",
            "HTTPS://Docs.Example.com/A/b//",
            "https://developer.apple.com/documentation/virtualization/vzvirtualmachine/start()",
            "https://x.com/a/?",
            "https://x.com/?q=a/",
            "file:///",
            "not a url/#frag",
            "  https://x.com/spaced/  ",
            "#only-fragment",
            "/",
        ];
        for input in inputs {
            let once = canonicalize(input);
            let twice = canonicalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn join_resolves_relative_hrefs() {
        let base = canonicalize("https://docs.example.com/guide/intro");
        assert_eq!(
            base.join("setup/").unwrap().as_str(),
            "https://docs.example.com/guide/setup"
        );
        assert_eq!(
            base.join("/api#top").unwrap().as_str(),
            "https://docs.example.com/api"
        );
        assert_eq!(
            base.join("https://other.example.com/x/").unwrap().as_str(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn join_ignores_non_navigational_links() {
        let base = canonicalize("https://docs.example.com/guide");
        assert!(base.join("#section").is_none());
        assert!(base.join("javascript:void(0)").is_none());
        assert!(base.join("mailto:team@example.com").is_none());
        assert!(base.join("   ").is_none());
    }
}
