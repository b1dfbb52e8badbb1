// ABOUTME: Regex-based listing extraction for payloads where no fragment parses as JSON.
// ABOUTME: Handles title-before-slug and slug-before-title field orders, then small article arrays.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use super::StubCollector;
use crate::payload::decode_json_string;

/// Skips anything within the current object level, including one level of nested `{...}`.
const GAP: &str = r"(?:[^{}]|\{[^{}]*\})*?";

/// A JSON string body, escaped characters included.
const STR: &str = r#"(?:[^"\\]|\\.)*"#;

/// `"slug": "x"` or `"slug": {..."current": "x"...}`.
const SLUG: &str = r#""slug"\s*:\s*(?:\{[^{}]*?"current"\s*:\s*"(?P<slug_current>[^"\\]+)"[^{}]*\}|"(?P<slug>[^"\\]+)")"#;

static TITLE_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#""title"\s*:\s*"(?P<title>{STR})"{GAP}{SLUG}(?:{GAP}"publishedOn"\s*:\s*"(?P<published>[^"\\]*)")?(?:{GAP}"summary"\s*:\s*"(?P<summary>{STR})")?"#,
    );
    Regex::new(&pattern).unwrap()
});

static SLUG_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#"(?:"publishedOn"\s*:\s*"(?P<published>[^"\\]*)"{GAP})?{SLUG}(?:{GAP}"summary"\s*:\s*"(?P<summary>{STR})")?{GAP}"title"\s*:\s*"(?P<title>{STR})"(?:{GAP}"publishedOn"\s*:\s*"(?P<published_after>[^"\\]*)")?"#,
    );
    Regex::new(&pattern).unwrap()
});

/// A flat array of objects, cut at the first closing square bracket.
static OBJECT_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*\{[^\[\]]*\}\s*\]").unwrap());

/// Strategy one: `title` appears before `slug` in the object.
pub(super) fn title_before_slug(text: &str, collector: &mut StubCollector) -> usize {
    collect_matches(&TITLE_FIRST_RE, text, collector)
}

/// Strategy two: `slug` appears before `title`, the CMS' alphabetical key order.
pub(super) fn slug_before_title(text: &str, collector: &mut StubCollector) -> usize {
    collect_matches(&SLUG_FIRST_RE, text, collector)
}

/// Strategy three: parse just the small arrays that mention both `title` and `slug`.
pub(super) fn article_arrays(text: &str, collector: &mut StubCollector) -> usize {
    let before = collector.len();
    for m in OBJECT_ARRAY_RE.find_iter(text) {
        let candidate = m.as_str();
        if !(candidate.contains("\"title\"") && candidate.contains("\"slug\"")) {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            collector.visit(&value);
        }
    }
    collector.len() - before
}

fn collect_matches(re: &Regex, text: &str, collector: &mut StubCollector) -> usize {
    let mut added = 0;
    for caps in re.captures_iter(text) {
        let title = group(&caps, &["title"]);
        let slug = group(&caps, &["slug_current", "slug"]);
        let published = group(&caps, &["published", "published_after"]);
        let summary = group(&caps, &["summary"]);
        if collector.push(&title, &slug, &published, &summary) {
            added += 1;
        }
    }
    added
}

/// First non-empty named group among `names`, JSON-unescaped.
fn group(caps: &Captures<'_>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| caps.name(name))
        .map(|m| m.as_str())
        .find(|s| !s.is_empty())
        .map(decode_json_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_SITE_BASE;

    fn collector() -> StubCollector {
        StubCollector::new(DEFAULT_SITE_BASE, "https://www.anthropic.com/engineering")
    }

    #[test]
    fn title_first_with_slug_object_and_summary() {
        let text = r#"xx{"title":"Building \"Agents\"","_id":"1","slug":{"_type":"slug","current":"agents"},"publishedOn":"2024-12-19","summary":"How we build"} broken"#;
        let mut c = collector();
        assert_eq!(title_before_slug(text, &mut c), 1);
        let stub = &c.into_stubs()[0];
        assert_eq!(stub.title, "Building \"Agents\"");
        assert_eq!(stub.slug, "agents");
        assert_eq!(stub.published_on, "2024-12-19");
        assert_eq!(stub.summary, "How we build");
    }

    #[test]
    fn slug_first_alphabetical_order() {
        let text = r#"{"publishedOn":"2025-03-01","slug":{"current":"context"},"summary":"Tips","title":"Effective context"}"#;
        let mut c = collector();
        assert_eq!(slug_before_title(text, &mut c), 1);
        let stub = &c.into_stubs()[0];
        assert_eq!(stub.slug, "context");
        assert_eq!(stub.title, "Effective context");
        assert_eq!(stub.published_on, "2025-03-01");
        assert_eq!(stub.summary, "Tips");
    }

    #[test]
    fn slug_first_with_trailing_date() {
        let text = r#"{"slug":"plain","title":"Plain slug","publishedOn":"2025-04-04"}"#;
        let mut c = collector();
        slug_before_title(text, &mut c);
        let stub = &c.into_stubs()[0];
        assert_eq!(stub.slug, "plain");
        assert_eq!(stub.published_on, "2025-04-04");
    }

    #[test]
    fn fields_in_other_objects_are_not_paired() {
        let text = r#"{"title":"Image caption"},{"slug":"elsewhere"}"#;
        let mut c = collector();
        assert_eq!(title_before_slug(text, &mut c), 0);
        assert_eq!(slug_before_title(text, &mut c), 0);
    }

    #[test]
    fn strategies_share_seen_set() {
        let text = r#"{"title":"Dup","slug":"dup"} {"slug":"dup","title":"Dup again"}"#;
        let mut c = collector();
        title_before_slug(text, &mut c);
        slug_before_title(text, &mut c);
        let stubs = c.into_stubs();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Dup");
    }

    #[test]
    fn parses_small_article_arrays() {
        let text = r#"prefix [{"title":"Arr","slug":"arr"},{"title":"Ay","slug":{"current":"ay"}}] {"broken": "#;
        let mut c = collector();
        assert_eq!(article_arrays(text, &mut c), 2);
    }

    #[test]
    fn array_without_both_keys_is_skipped() {
        let text = r#"[{"title":"No slug here"}]"#;
        let mut c = collector();
        assert_eq!(article_arrays(text, &mut c), 0);
    }
}
