// ABOUTME: Rich-text content block model, its construction from CMS JSON, and body-array discovery.
// ABOUTME: Renderers live in the html and markdown submodules and share mark resolution from here.

//! Rich-text body blocks.
//!
//! The CMS stores an article body as an array of typed JSON objects. They are
//! read once into [`ContentBlock`], a closed sum type with an explicit
//! [`ContentBlock::Unknown`] variant, and both renderers match on it
//! exhaustively.

mod html;
mod markdown;

pub use html::render_blocks_to_html;
pub use markdown::render_blocks_to_markdown;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::scan::bracketed_slice;

static BODY_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""body"\s*:\s*\["#).unwrap());

/// One structural unit of an article body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Text(TextBlock),
    ListItem(ListItem),
    Code(CodeBlock),
    Image(ImageBlock),
    Table(TableBlock),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Normal,
    Heading(u8),
    Blockquote,
}

/// Paragraph, heading or quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub style: TextStyle,
    pub children: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub kind: ListKind,
    pub children: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageBlock {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBlock {
    pub rows: Vec<Vec<String>>,
}

/// A run of text with the marks applied to it, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

/// Block-scoped annotation that span marks refer to by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type", default)]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// A span mark after resolution against the block's mark definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark<'a> {
    Strong,
    Em,
    Code,
    Link(&'a str),
}

/// Resolves a span mark. Decorators are matched by name, anything else is a
/// key into `defs`; only link definitions with an `href` resolve.
pub(crate) fn resolve_mark<'a>(mark: &str, defs: &'a [MarkDef]) -> Option<Mark<'a>> {
    match mark {
        "strong" => Some(Mark::Strong),
        "em" => Some(Mark::Em),
        "code" => Some(Mark::Code),
        key => defs
            .iter()
            .find(|def| def.key == key && def.kind == "link")
            .and_then(|def| def.href.as_deref())
            .map(Mark::Link),
    }
}

impl ContentBlock {
    /// Reads one block from CMS JSON. Anything unrecognised becomes `Unknown`.
    pub fn from_value(value: &Value) -> ContentBlock {
        let Some(obj) = value.as_object() else {
            return ContentBlock::Unknown;
        };
        let str_field = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("");

        match str_field("_type") {
            "block" => {
                let children = spans(obj.get("children"));
                let mark_defs = mark_defs(obj.get("markDefs"));
                let kind = match str_field("listItem") {
                    "bullet" => Some(ListKind::Bullet),
                    "number" => Some(ListKind::Number),
                    _ => None,
                };
                match kind {
                    Some(kind) => ContentBlock::ListItem(ListItem {
                        kind,
                        children,
                        mark_defs,
                    }),
                    None => ContentBlock::Text(TextBlock {
                        style: text_style(str_field("style")),
                        children,
                        mark_defs,
                    }),
                }
            }
            "code" | "codeBlock" => ContentBlock::Code(CodeBlock {
                language: Some(str_field("language").trim())
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
                code: str_field("code").to_string(),
            }),
            "image" => ContentBlock::Image(ImageBlock {
                src: image_source(obj.get("url"), obj.get("asset")),
                alt: [str_field("alt"), str_field("description")]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or("")
                    .to_string(),
                caption: plain_text(obj.get("caption")),
            }),
            "table" => ContentBlock::Table(TableBlock {
                rows: table_rows(obj.get("rows")),
            }),
            _ => ContentBlock::Unknown,
        }
    }
}

fn text_style(style: &str) -> TextStyle {
    match style {
        "blockquote" => TextStyle::Blockquote,
        s => match s.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) {
            Some(level @ 1..=6) => TextStyle::Heading(level),
            _ => TextStyle::Normal,
        },
    }
}

fn spans(children: Option<&Value>) -> Vec<Span> {
    children
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|child| Span::deserialize(child).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn mark_defs(defs: Option<&Value>) -> Vec<MarkDef> {
    defs.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|def| MarkDef::deserialize(def).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Direct `url`, then the resolved `asset.url`, then the raw `asset._ref`.
fn image_source(url: Option<&Value>, asset: Option<&Value>) -> String {
    let asset_field = |key: &str| asset.and_then(|a| a.get(key)).and_then(Value::as_str);
    [url.and_then(Value::as_str), asset_field("url"), asset_field("_ref")]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Flattens a caption given either as a string or as blocks/spans.
fn plain_text(value: Option<&Value>) -> String {
    fn collect(value: &Value, out: &mut String) {
        match value {
            Value::String(s) => out.push_str(s),
            Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
            Value::Object(obj) => {
                if let Some(text) = obj.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                } else if let Some(children) = obj.get("children") {
                    collect(children, out);
                }
            }
            _ => {}
        }
    }
    let mut out = String::new();
    if let Some(value) = value {
        collect(value, &mut out);
    }
    out.trim().to_string()
}

fn table_rows(rows: Option<&Value>) -> Vec<Vec<String>> {
    let Some(rows) = rows.and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| row.get("cells").and_then(Value::as_array))
        .map(|cells| cells.iter().map(|cell| plain_text(Some(cell))).collect())
        .collect()
}

/// Finds the article body array in combined payload text and reads its blocks.
///
/// Each `"body": [` occurrence is tried in order; the first array that
/// bracket-matches and parses after repair wins. Returns an empty list when
/// none does.
pub fn extract_body_blocks(text: &str) -> Vec<ContentBlock> {
    for m in BODY_KEY_RE.find_iter(text) {
        let start = m.end() - 1;
        let Some(array) = bracketed_slice(text, start, text.len() - start) else {
            continue;
        };
        let repaired = repair_escapes(array);
        match serde_json::from_str::<Vec<Value>>(&repaired) {
            Ok(items) => return items.iter().map(ContentBlock::from_value).collect(),
            Err(e) => debug!(offset = start, error = %e, "body array did not parse"),
        }
    }
    Vec::new()
}

/// Rewrites a backslash followed by a literal newline or tab into the
/// corresponding two-character JSON escape.
fn repair_escapes(raw: &str) -> String {
    raw.replace("\\\n", "\\n").replace("\\\t", "\\t")
}
