// ABOUTME: Renders content blocks to an HTML fragment, grouping consecutive list items.
// ABOUTME: All text and attribute values are escaped; empty paragraphs are omitted.

use super::{resolve_mark, ContentBlock, ListKind, Mark, MarkDef, Span, TextBlock, TextStyle};

/// Renders blocks as newline-separated HTML elements.
///
/// Consecutive list items of one kind share a `<ul>` or `<ol>`, closed as
/// soon as a block of any other kind follows. `Unknown` blocks emit nothing.
pub fn render_blocks_to_html(blocks: &[ContentBlock]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks {
        if let ContentBlock::ListItem(item) = block {
            if open_list != Some(item.kind) {
                if let Some(kind) = open_list.take() {
                    lines.push(list_tag(kind, true));
                }
                lines.push(list_tag(item.kind, false));
                open_list = Some(item.kind);
            }
            lines.push(format!(
                "<li>{}</li>",
                render_spans(&item.children, &item.mark_defs)
            ));
            continue;
        }
        if matches!(block, ContentBlock::Unknown) {
            continue;
        }

        if let Some(kind) = open_list.take() {
            lines.push(list_tag(kind, true));
        }
        if let Some(html) = render_block(block) {
            lines.push(html);
        }
    }

    if let Some(kind) = open_list {
        lines.push(list_tag(kind, true));
    }
    lines.join("\n")
}

fn list_tag(kind: ListKind, closing: bool) -> String {
    let name = match kind {
        ListKind::Bullet => "ul",
        ListKind::Number => "ol",
    };
    if closing {
        format!("</{}>", name)
    } else {
        format!("<{}>", name)
    }
}

fn render_block(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Text(text) => render_text(text),
        ContentBlock::Code(code) => {
            let class = code
                .language
                .as_deref()
                .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
                .unwrap_or_default();
            Some(format!(
                "<pre><code{}>{}</code></pre>",
                class,
                escape_html(&code.code)
            ))
        }
        ContentBlock::Image(image) => {
            if image.src.is_empty() {
                return None;
            }
            let mut html = format!(
                "<figure><img src=\"{}\" alt=\"{}\">",
                escape_html(&image.src),
                escape_html(&image.alt)
            );
            if !image.caption.is_empty() {
                html.push_str(&format!("<figcaption>{}</figcaption>", escape_html(&image.caption)));
            }
            html.push_str("</figure>");
            Some(html)
        }
        ContentBlock::Table(table) => {
            let (header, body) = table.rows.split_first()?;
            let mut out = vec![
                "<table>".to_string(),
                "<thead>".to_string(),
                table_row(header, "th"),
                "</thead>".to_string(),
            ];
            if !body.is_empty() {
                out.push("<tbody>".to_string());
                out.extend(body.iter().map(|row| table_row(row, "td")));
                out.push("</tbody>".to_string());
            }
            out.push("</table>".to_string());
            Some(out.join("\n"))
        }
        ContentBlock::ListItem(_) | ContentBlock::Unknown => None,
    }
}

fn render_text(text: &TextBlock) -> Option<String> {
    let inner = render_spans(&text.children, &text.mark_defs);
    match text.style {
        TextStyle::Normal if inner.trim().is_empty() => None,
        TextStyle::Normal => Some(format!("<p>{}</p>", inner)),
        TextStyle::Heading(level) => Some(format!("<h{0}>{1}</h{0}>", level, inner)),
        TextStyle::Blockquote => Some(format!("<blockquote>{}</blockquote>", inner)),
    }
}

fn table_row(cells: &[String], tag: &str) -> String {
    let cells: String = cells
        .iter()
        .map(|cell| format!("<{0}>{1}</{0}>", tag, escape_html(cell)))
        .collect();
    format!("<tr>{}</tr>", cells)
}

/// Renders spans with their marks applied innermost-first, in mark order.
fn render_spans(spans: &[Span], defs: &[MarkDef]) -> String {
    spans
        .iter()
        .map(|span| {
            span.marks
                .iter()
                .filter_map(|mark| resolve_mark(mark, defs))
                .fold(escape_html(&span.text), |inner, mark| match mark {
                    Mark::Strong => format!("<strong>{}</strong>", inner),
                    Mark::Em => format!("<em>{}</em>", inner),
                    Mark::Code => format!("<code>{}</code>", inner),
                    Mark::Link(href) => format!("<a href=\"{}\">{}</a>", escape_html(href), inner),
                })
        })
        .collect()
}

/// Escapes `&`, `<`, `>` and `"` for text and attribute positions.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
