// ABOUTME: Generic HTML helpers for pages without a structured body: main-content selection,
// ABOUTME: sanitizing, Markdown and plain-text conversion, and title/description lookup.

//! Generic document extraction.
//!
//! Used when an article page carries no recoverable CMS body, so the
//! visible HTML is the only source left.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Number of characters kept for a generated summary.
pub const EXCERPT_CHARS: usize = 200;

/// Sanitize article HTML down to structural and inline formatting tags.
pub fn sanitize_html(html: &str) -> String {
    let allowed_tags = [
        "p", "br", "strong", "b", "em", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
        "li", "blockquote", "pre", "code", "img", "a", "figure", "figcaption", "table", "thead",
        "tbody", "tr", "th", "td",
    ];

    let mut builder = ammonia::Builder::new();
    builder.tags(allowed_tags.iter().copied().collect());
    builder.add_tag_attributes("a", &["href"]);
    builder.add_tag_attributes("img", &["src", "alt", "width", "height"]);
    builder.add_tag_attributes("code", &["class"]);

    builder
        .url_schemes(["http", "https", "mailto"].iter().copied().collect())
        .clean(html)
        .to_string()
}

/// Convert HTML to Markdown using htmd, capping blank-line runs at one.
///
/// On conversion error the input is returned unchanged.
pub fn html_to_markdown(html: &str) -> String {
    let preprocessed = BR_RE.replace_all(html, "\n");
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    let md = converter
        .convert(&preprocessed)
        .unwrap_or_else(|_| preprocessed.to_string());
    BLANK_LINES_RE.replace_all(md.trim(), "\n\n").to_string()
}

/// Convert HTML to plain text, one newline between blocks of text.
pub fn html_to_text(html: &str) -> String {
    let preprocessed = BR_RE.replace_all(html, "\n");
    let document = Html::parse_document(&preprocessed);
    let raw_text = document.root_element().text().collect::<Vec<_>>().join(" ");

    let normalized = SPACES_RE.replace_all(&raw_text, " ");
    let collapsed = NEWLINES_RE.replace_all(&normalized, "\n");
    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First non-empty text or `content` attribute among `candidates`.
fn first_match(document: &Html, candidates: &[(&str, Option<&str>)]) -> Option<String> {
    candidates.iter().find_map(|(css, attr)| {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        let value = match attr {
            Some(attr) => element.value().attr(attr)?.trim().to_string(),
            None => element.text().collect::<String>().trim().to_string(),
        };
        Some(value).filter(|v| !v.is_empty())
    })
}

/// Title from `<title>`, then `og:title`, then the first `<h1>`.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(
        &document,
        &[
            ("title", None),
            ("meta[property='og:title']", Some("content")),
            ("h1", None),
        ],
    )
}

/// Description from `meta[name=description]` or `og:description`.
pub fn extract_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(
        &document,
        &[
            ("meta[name='description']", Some("content")),
            ("meta[property='og:description']", Some("content")),
        ],
    )
}

/// Inner HTML of the first non-empty `<article>`, `<main>` or `<body>`.
pub fn extract_main_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    ["article", "main", "body"].iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .map(|element| element.inner_html())
            .find(|inner| !inner.trim().is_empty())
    })
}

/// First [`EXCERPT_CHARS`] characters of the document text, if any.
pub fn extract_excerpt(html: &str) -> Option<String> {
    let text = html_to_text(html).replace('\n', " ");
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(EXCERPT_CHARS).collect())
}
