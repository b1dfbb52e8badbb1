// ABOUTME: Renders content blocks to Markdown with blank lines between blocks.
// ABOUTME: List items are joined by single newlines and numbered lists restart after any other block.

use super::{resolve_mark, ContentBlock, ListKind, Mark, MarkDef, Span, TextStyle};

/// Renders blocks as Markdown. Text is emitted as-is, without escaping.
pub fn render_blocks_to_markdown(blocks: &[ContentBlock]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut list: Option<(ListKind, Vec<String>)> = None;

    for block in blocks {
        match block {
            ContentBlock::ListItem(item) => {
                let text = render_spans(&item.children, &item.mark_defs);
                match &mut list {
                    Some((kind, lines)) if *kind == item.kind => {
                        let line = list_line(item.kind, lines.len() + 1, &text);
                        lines.push(line);
                    }
                    _ => {
                        flush_list(&mut list, &mut parts);
                        list = Some((item.kind, vec![list_line(item.kind, 1, &text)]));
                    }
                }
            }
            ContentBlock::Unknown => {}
            other => {
                flush_list(&mut list, &mut parts);
                if let Some(md) = render_block(other) {
                    parts.push(md);
                }
            }
        }
    }
    flush_list(&mut list, &mut parts);

    parts.join("\n\n")
}

fn flush_list(list: &mut Option<(ListKind, Vec<String>)>, parts: &mut Vec<String>) {
    if let Some((_, lines)) = list.take() {
        parts.push(lines.join("\n"));
    }
}

fn list_line(kind: ListKind, number: usize, text: &str) -> String {
    match kind {
        ListKind::Bullet => format!("- {}", text),
        ListKind::Number => format!("{}. {}", number, text),
    }
}

fn render_block(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Text(text) => {
            let inner = render_spans(&text.children, &text.mark_defs);
            if inner.trim().is_empty() {
                return None;
            }
            Some(match text.style {
                TextStyle::Normal => inner,
                TextStyle::Heading(level) => {
                    format!("{} {}", "#".repeat(usize::from(level)), inner)
                }
                TextStyle::Blockquote => inner
                    .lines()
                    .map(|line| format!("> {}", line))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
        }
        ContentBlock::Code(code) => Some(format!(
            "```{}\n{}\n```",
            code.language.as_deref().unwrap_or(""),
            code.code.trim_end_matches('\n')
        )),
        ContentBlock::Image(image) => {
            if image.src.is_empty() {
                return None;
            }
            let mut md = format!("![{}]({})", image.alt, image.src);
            if !image.caption.is_empty() {
                md.push_str(&format!("\n*{}*", image.caption));
            }
            Some(md)
        }
        ContentBlock::Table(table) => {
            let (header, body) = table.rows.split_first()?;
            let mut lines = vec![
                table_row(header),
                table_row(&vec!["---".to_string(); header.len()]),
            ];
            lines.extend(body.iter().map(|row| table_row(row)));
            Some(lines.join("\n"))
        }
        ContentBlock::ListItem(_) | ContentBlock::Unknown => None,
    }
}

fn table_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |", cells.join(" | "))
}

fn render_spans(spans: &[Span], defs: &[MarkDef]) -> String {
    spans
        .iter()
        .map(|span| {
            span.marks
                .iter()
                .filter_map(|mark| resolve_mark(mark, defs))
                .fold(span.text.clone(), |inner, mark| match mark {
                    Mark::Strong => format!("**{}**", inner),
                    Mark::Em => format!("*{}*", inner),
                    Mark::Code => format!("`{}`", inner),
                    Mark::Link(href) => format!("[{}]({})", inner, href),
                })
        })
        .collect()
}
