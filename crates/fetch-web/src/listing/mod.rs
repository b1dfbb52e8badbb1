// ABOUTME: Listing-page extraction: turns combined RSC payload text into deduplicated article stubs.
// ABOUTME: Runs JSON fragment recovery first, then the pattern fallbacks only when recovery found nothing.

//! Article listing extraction.
//!
//! A listing page ships its article index somewhere inside the RSC payloads,
//! with no fixed position or shape. Extraction works in two tiers:
//!
//! 1. [`recover`] carves every parseable JSON fragment out of the text and
//!    walks it for objects carrying both `title` and `slug`.
//! 2. [`fallback`] runs regex strategies over the raw text when tier 1 yields
//!    nothing, for pages where one malformed field breaks every fragment.
//!
//! Both tiers feed one [`StubCollector`], which owns the seen-slug set for a
//! single extraction call.

mod fallback;
mod recover;

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::models::ArticleStub;
use crate::options::DEFAULT_SITE_BASE;
use crate::payload::combine_payloads;

/// Finds article stubs in listing-page payloads, building URLs on the default site base.
///
/// `feed_url` supplies the listing base path (its URL path, trailing slash
/// stripped); each stub's URL is `<site base><base path>/<slug>`.
pub fn find_article_stubs(payloads: &[String], feed_url: &str) -> Vec<ArticleStub> {
    find_article_stubs_with_base(payloads, feed_url, DEFAULT_SITE_BASE)
}

/// Same as [`find_article_stubs`] with an explicit site base.
pub fn find_article_stubs_with_base(
    payloads: &[String],
    feed_url: &str,
    site_base: &str,
) -> Vec<ArticleStub> {
    let combined = combine_payloads(payloads);
    let mut collector = StubCollector::new(site_base, feed_url);

    let fragments = recover::recover_fragments(&combined, &mut collector);
    debug!(
        payloads = payloads.len(),
        fragments,
        stubs = collector.len(),
        "json fragment recovery finished"
    );

    if collector.is_empty() {
        fallback::title_before_slug(&combined, &mut collector);
        fallback::slug_before_title(&combined, &mut collector);
        fallback::article_arrays(&combined, &mut collector);
        debug!(stubs = collector.len(), "pattern fallback finished");
    }

    collector.into_stubs()
}

/// Extracts the listing base path from a feed URL: its path with any trailing slash removed.
pub fn listing_base_path(feed_url: &str) -> String {
    let path = match Url::parse(feed_url) {
        Ok(url) => url.path().to_string(),
        Err(_) if feed_url.starts_with('/') => feed_url.to_string(),
        Err(_) => String::new(),
    };
    path.trim_end_matches('/').to_string()
}

/// Per-call accumulator: seen slugs plus the stubs emitted so far, in discovery order.
pub(crate) struct StubCollector {
    url_prefix: String,
    seen: HashSet<String>,
    stubs: Vec<ArticleStub>,
}

impl StubCollector {
    pub(crate) fn new(site_base: &str, feed_url: &str) -> Self {
        Self {
            url_prefix: format!(
                "{}{}",
                site_base.trim_end_matches('/'),
                listing_base_path(feed_url)
            ),
            seen: HashSet::new(),
            stubs: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.stubs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Records a stub unless its slug is empty or already seen. Returns whether it was added.
    pub(crate) fn push(&mut self, title: &str, slug: &str, published_on: &str, summary: &str) -> bool {
        let slug = slug.trim();
        if slug.is_empty() || !self.seen.insert(slug.to_string()) {
            return false;
        }
        self.stubs.push(ArticleStub {
            title: title.to_string(),
            slug: slug.to_string(),
            published_on: published_on.to_string(),
            summary: summary.to_string(),
            url: format!("{}/{}", self.url_prefix, slug),
        });
        true
    }

    /// Depth-first walk over a parsed value. Every object is checked, and
    /// children are visited whether or not their parent matched.
    pub(crate) fn visit(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                self.collect_object(map);
                for child in map.values() {
                    self.visit(child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            _ => {}
        }
    }

    fn collect_object(&mut self, map: &Map<String, Value>) {
        let Some(title) = map.get("title").and_then(Value::as_str) else {
            return;
        };
        let Some(slug) = map.get("slug").and_then(resolve_slug) else {
            return;
        };
        let published_on = first_str(map, &["publishedOn", "date"]);
        let summary = first_str(map, &["summary", "description"]);
        self.push(title, slug, published_on, summary);
    }

    pub(crate) fn into_stubs(self) -> Vec<ArticleStub> {
        self.stubs
    }
}

/// A slug is either a bare string or a `{ "current": "..." }` object.
fn resolve_slug(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("current").and_then(Value::as_str),
        _ => None,
    }
}

fn first_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn base_path_strips_trailing_slash() {
        assert_eq!(listing_base_path("https://www.anthropic.com/engineering/"), "/engineering");
        assert_eq!(listing_base_path("https://www.anthropic.com/engineering"), "/engineering");
        assert_eq!(listing_base_path("https://www.anthropic.com"), "");
        assert_eq!(listing_base_path("/news/"), "/news");
        assert_eq!(listing_base_path("not a url"), "");
    }

    #[test]
    fn collector_deduplicates_and_builds_urls() {
        let mut c = StubCollector::new("https://www.anthropic.com/", "https://www.anthropic.com/news");
        assert!(c.push("A", "a", "", ""));
        assert!(!c.push("A again", "a", "", ""));
        assert!(!c.push("Empty", "  ", "", ""));
        let stubs = c.into_stubs();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].url, "https://www.anthropic.com/news/a");
    }

    #[test]
    fn visit_checks_every_depth_first_wins() {
        let value = json!({
            "title": "Outer",
            "slug": "outer",
            "related": [
                {"title": "Inner", "slug": {"current": "inner"}, "date": "2024-01-02", "description": "D"},
                {"title": "Outer copy", "slug": "outer"}
            ]
        });
        let mut c = StubCollector::new(DEFAULT_SITE_BASE, "https://www.anthropic.com/engineering");
        c.visit(&value);
        let stubs = c.into_stubs();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].title, "Outer");
        assert_eq!(stubs[1].slug, "inner");
        assert_eq!(stubs[1].published_on, "2024-01-02");
        assert_eq!(stubs[1].summary, "D");
    }

    #[test]
    fn prefers_published_on_and_summary_over_fallbacks() {
        let value = json!({
            "title": "T", "slug": "t",
            "publishedOn": "2025-05-05", "date": "1999-01-01",
            "summary": "S", "description": "D"
        });
        let mut c = StubCollector::new(DEFAULT_SITE_BASE, "/x");
        c.visit(&value);
        let stub = &c.into_stubs()[0];
        assert_eq!(stub.published_on, "2025-05-05");
        assert_eq!(stub.summary, "S");
    }

    #[test]
    fn non_string_title_or_slug_is_ignored() {
        let value = json!([
            {"title": {"text": "x"}, "slug": "a"},
            {"title": "B", "slug": 42},
            {"title": "C", "slug": {"_type": "slug"}}
        ]);
        let mut c = StubCollector::new(DEFAULT_SITE_BASE, "/x");
        c.visit(&value);
        assert!(c.is_empty());
    }

    #[test]
    fn falls_back_to_patterns_when_json_breaks() {
        // Unterminated outer object: no fragment containing both fields parses.
        let payload = r#"{"items":[{"title":"Broken Out","slug":{"_type":"slug","current":"broken-out"},"publishedOn":"2025-02-02","summary":"Sum", "bad": tru"#;
        let stubs = find_article_stubs(&[payload.to_string()], "https://www.anthropic.com/engineering");
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].slug, "broken-out");
        assert_eq!(stubs[0].title, "Broken Out");
        assert_eq!(stubs[0].published_on, "2025-02-02");
        assert_eq!(stubs[0].url, "https://www.anthropic.com/engineering/broken-out");
    }
}
