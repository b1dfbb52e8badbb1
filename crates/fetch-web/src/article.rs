// ABOUTME: Single-article metadata extraction (title, summary, publishedOn) from combined payload text.
// ABOUTME: Anchors on a reliable field after the article's `_type`, then searches a bounded window around it.

//! Single-article metadata extraction.
//!
//! An article page carries the whole document, body included, in its
//! payloads. The body can run past 100K characters and may contain its own
//! `title` keys (image captions, colour swatches), so a plain "first title"
//! search is unreliable. Instead:
//!
//! 1. Find the article's `_type` discriminator, then the first anchor field
//!    (`publishedOn` by default) after it. The CMS emits keys alphabetically,
//!    so the body precedes the anchor and `summary`/`title` follow closely.
//! 2. Without an anchor, search a fixed prefix of the text.
//! 3. Without a title, take the first parseable object whose `_type` is a
//!    known article type.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::ArticleMetadata;
use crate::options::ExtractorConfig;
use crate::payload::decode_json_string;
use crate::scan::{find_matching_close, opening_braces, MAX_LOOKAHEAD};

/// Bytes searched before the anchor.
const WINDOW_BEFORE: usize = 500;
/// Bytes searched after the anchor.
const WINDOW_AFTER: usize = 5_000;
/// Bytes searched when no anchor was found.
const PREFIX_SCAN: usize = 50_000;
/// Shortest value accepted as a title.
const MIN_TITLE_CHARS: usize = 5;

static TITLE_RE: Lazy<Regex> = Lazy::new(|| string_field_regex("title"));
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| string_field_regex("summary"));
static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{3,8}$").unwrap());

/// Extracts one article's metadata using the default discriminators and anchor.
pub fn extract_single_article_metadata(text: &str) -> ArticleMetadata {
    extract_single_article_metadata_with(text, &ExtractorConfig::default())
}

/// Extracts one article's metadata with explicit discriminators and anchor field.
pub fn extract_single_article_metadata_with(text: &str, config: &ExtractorConfig) -> ArticleMetadata {
    let anchor_re = string_field_regex(&config.anchor_field);

    let mut meta = match anchored_metadata(text, config, &anchor_re) {
        Some(meta) => meta,
        None => {
            debug!(anchor = %config.anchor_field, "no anchor after any article type; scanning prefix");
            let prefix = &text[..ceil_boundary(text, PREFIX_SCAN)];
            ArticleMetadata {
                title: first_plausible_title(prefix),
                summary: first_capture(&SUMMARY_RE, prefix),
                published_on: first_capture(&anchor_re, prefix),
            }
        }
    };

    if meta.title.is_empty() {
        debug!("no title near anchor; looking for a typed article object");
        if let Some(obj) = first_article_object(text, config) {
            fill_from_object(&mut meta, &obj, &config.anchor_field);
        }
    }

    meta
}

/// Tries each discriminator in order; the first one followed by an anchor wins.
fn anchored_metadata(text: &str, config: &ExtractorConfig, anchor_re: &Regex) -> Option<ArticleMetadata> {
    for article_type in &config.article_types {
        let type_re = discriminator_regex(article_type);
        let Some(type_match) = type_re.find(text) else {
            continue;
        };
        let after = type_match.end();
        let Some(caps) = anchor_re.captures(&text[after..]) else {
            continue;
        };
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let anchor_at = after + whole.start();
        let start = floor_boundary(text, anchor_at.saturating_sub(WINDOW_BEFORE));
        let end = ceil_boundary(text, anchor_at.saturating_add(WINDOW_AFTER));
        let window = &text[start..end];

        return Some(ArticleMetadata {
            title: first_plausible_title(window),
            summary: first_capture(&SUMMARY_RE, window),
            published_on: decode_json_string(value.as_str()),
        });
    }
    None
}

/// First `title` value that is neither a hex colour nor implausibly short.
fn first_plausible_title(haystack: &str) -> String {
    TITLE_RE
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_json_string(m.as_str()))
        .find(|title| is_plausible_title(title))
        .unwrap_or_default()
}

fn is_plausible_title(title: &str) -> bool {
    let trimmed = title.trim();
    !HEX_COLOR_RE.is_match(trimmed) && trimmed.chars().count() >= MIN_TITLE_CHARS
}

fn first_capture(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_json_string(m.as_str()))
        .unwrap_or_default()
}

/// Scans standalone `{...}` objects for the first one typed as an article with a string title.
///
/// A parsed object that does not qualify is searched depth-first, and its
/// range is skipped afterwards.
fn first_article_object(text: &str, config: &ExtractorConfig) -> Option<Map<String, Value>> {
    let mut consumed_until: Option<usize> = None;
    for start in opening_braces(text) {
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
        if let Some(found) = find_typed_object(&value, config) {
            return Some(found.clone());
        }
    }
    None
}

fn find_typed_object<'a>(value: &'a Value, config: &ExtractorConfig) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => {
            let typed = map
                .get("_type")
                .and_then(Value::as_str)
                .is_some_and(|t| config.article_types.iter().any(|known| known == t));
            let titled = map
                .get("title")
                .and_then(Value::as_str)
                .is_some_and(|t| !HEX_COLOR_RE.is_match(t.trim()));
            if typed && titled {
                return Some(map);
            }
            map.values().find_map(|child| find_typed_object(child, config))
        }
        Value::Array(items) => items.iter().find_map(|item| find_typed_object(item, config)),
        _ => None,
    }
}

fn fill_from_object(meta: &mut ArticleMetadata, obj: &Map<String, Value>, anchor_field: &str) {
    let get = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };
    if let Some(title) = get(&["title"]) {
        meta.title = title;
    }
    if meta.summary.is_empty() {
        meta.summary = get(&["summary", "description"]).unwrap_or_default();
    }
    if meta.published_on.is_empty() {
        meta.published_on = get(&[anchor_field, "publishedOn", "date"]).unwrap_or_default();
    }
}

/// `"<field>": "<value>"`, capturing the raw string body.
fn string_field_regex(field: &str) -> Regex {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(field));
    Regex::new(&pattern).unwrap()
}

fn discriminator_regex(article_type: &str) -> Regex {
    let pattern = format!(r#""_type"\s*:\s*"{}""#, regex::escape(article_type));
    Regex::new(&pattern).unwrap()
}

fn floor_boundary(s: &str, at: usize) -> usize {
    let mut i = at.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, at: usize) -> usize {
    let mut i = at.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
