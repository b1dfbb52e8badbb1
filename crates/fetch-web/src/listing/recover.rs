// ABOUTME: JSON fragment recovery: parses every bracket-delimited region that is valid JSON.
// ABOUTME: Parsed ranges are consumed so nested starts inside them are not reparsed.

use serde_json::Value;

use super::StubCollector;
use crate::scan::{find_matching_close, opening_brackets, MAX_LOOKAHEAD};

/// Parses every recoverable JSON fragment in `text` and walks it for article objects.
///
/// Returns the number of fragments that parsed. Malformed regions are
/// skipped and never abort the scan.
pub(super) fn recover_fragments(text: &str, collector: &mut StubCollector) -> usize {
    let mut parsed = 0;
    // Starts are visited in ascending order, so a single high-water mark
    // is enough to tell whether a start lies inside an already parsed range.
    let mut consumed_until: Option<usize> = None;

    for start in opening_brackets(text) {
        if consumed_until.is_some_and(|end| start <= end) {
            continue;
        }
        let Some(end) = find_matching_close(text, start, MAX_LOOKAHEAD) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) else {
            continue;
        };
        consumed_until = Some(end);
        parsed += 1;
        collector.visit(&value);
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_SITE_BASE;

    fn run(text: &str) -> (usize, Vec<crate::models::ArticleStub>) {
        let mut c = StubCollector::new(DEFAULT_SITE_BASE, "https://www.anthropic.com/engineering");
        let n = recover_fragments(text, &mut c);
        (n, c.into_stubs())
    }

    #[test]
    fn finds_objects_between_rsc_row_prefixes() {
        let text = concat!(
            "0:[\"$\",\"div\",null,{}]\n",
            "5:{\"articles\":[{\"title\":\"One\",\"slug\":{\"current\":\"one\"}},",
            "{\"title\":\"Two\",\"slug\":\"two\"}]}\n",
            "6:I[\"chunk\",\"x\"]"
        );
        let (n, stubs) = run(text);
        assert_eq!(n, 3);
        let slugs: Vec<_> = stubs.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["one", "two"]);
    }

    #[test]
    fn skips_malformed_region_and_recovers_nested_valid_one() {
        // Outer object is broken by a bare word, the inner one is fine.
        let text = r#"{"junk": oops, "inner": {"title":"Kept","slug":"kept"}}"#;
        let (n, stubs) = run(text);
        assert_eq!(n, 1);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].slug, "kept");
    }

    #[test]
    fn nested_starts_inside_parsed_range_are_not_reprocessed() {
        let text = r#"{"a":{"b":{"c":[1,2,3]}}}"#;
        let (n, _) = run(text);
        assert_eq!(n, 1);
    }

    #[test]
    fn brackets_inside_strings_do_not_break_recovery() {
        let text = r#"{"title":"Braces { and ] inside","slug":"braces"}"#;
        let (_, stubs) = run(text);
        assert_eq!(stubs[0].title, "Braces { and ] inside");
    }

    #[test]
    fn no_brackets_yields_nothing() {
        let (n, stubs) = run("plain text only");
        assert_eq!(n, 0);
        assert!(stubs.is_empty());
    }
}
