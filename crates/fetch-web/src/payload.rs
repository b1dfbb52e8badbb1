// ABOUTME: Extracts RSC payload strings pushed through `self.__next_f.push([n, "..."])` call sites.
// ABOUTME: Decodes JS string escapes once, or twice for double-encoded sources.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches one payload push and captures the raw string literal, escaped quotes included.
static PUSH_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)self\.__next_f\.push\(\[\s*\d+\s*,\s*"((?:[^"\\]|\\.)*)"\s*\]\)"#).unwrap()
});

/// Separator used when payloads are concatenated for scanning.
pub const PAYLOAD_SEPARATOR: &str = "\n";

/// Extracts every payload string from an HTML document, in source order.
///
/// With `double_unescape` enabled, a decoded payload that still contains an
/// escaped quote is decoded a second time. Disable it when the result will be
/// parsed as JSON and inner string escapes must survive.
pub fn extract_payloads(html: &str, double_unescape: bool) -> Vec<String> {
    PUSH_CALL_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|raw| decode_payload(raw.as_str(), double_unescape))
        .collect()
}

/// Joins payloads in encounter order so continued chunks line up again.
pub fn combine_payloads(payloads: &[String]) -> String {
    payloads.join(PAYLOAD_SEPARATOR)
}

fn decode_payload(raw: &str, double_unescape: bool) -> String {
    let once = unescape(raw);
    if double_unescape && once.contains("\\\"") {
        unescape(&once)
    } else {
        once
    }
}

/// Removes one layer of string escaping.
///
/// Handles `\"`, `\n`, `\t`, `\\` and `\uXXXX` (surrogate pairs included).
/// Any other backslash is kept as-is.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (decoded, used) = decode_escape(tail);
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..used]),
        }
        rest = &tail[used..];
    }
    out.push_str(rest);
    out
}

/// Decodes the escape at the start of `tail` (which begins with a backslash).
/// Returns the decoded char, if any, and the number of bytes consumed.
fn decode_escape(tail: &str) -> (Option<char>, usize) {
    match tail.as_bytes().get(1) {
        Some(b'"') => (Some('"'), 2),
        Some(b'n') => (Some('\n'), 2),
        Some(b't') => (Some('\t'), 2),
        Some(b'\\') => (Some('\\'), 2),
        Some(b'u') => decode_unicode_escape(tail),
        _ => (None, 1),
    }
}

fn decode_unicode_escape(tail: &str) -> (Option<char>, usize) {
    let Some(high) = hex4(tail, 2) else {
        return (None, 1);
    };

    if (0xD800..=0xDBFF).contains(&high) {
        if tail.get(6..8) == Some("\\u") {
            if let Some(low) = hex4(tail, 8) {
                if (0xDC00..=0xDFFF).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(code) {
                        return (Some(c), 12);
                    }
                }
            }
        }
        return (None, 1);
    }

    match char::from_u32(high) {
        Some(c) => (Some(c), 6),
        None => (None, 1),
    }
}

/// Decodes the body of a JSON string literal captured by a regex, falling back to the raw text.
pub(crate) fn decode_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

fn hex4(s: &str, at: usize) -> Option<u32> {
    let digits = s.get(at..at + 4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
