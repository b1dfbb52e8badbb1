// ABOUTME: String-aware bracket matching shared by every structured extraction pass.
// ABOUTME: A three-state scanner (normal, in-string, escaped) that ignores brackets inside JSON strings.

//! Bracket scanning over partially-trusted JSON text.
//!
//! RSC payloads embed JSON fragments in arbitrary surrounding text, so the
//! only way to carve out a candidate value is to walk forward from an opening
//! bracket and count depth. Brackets that appear inside string literals must
//! not count, and an escaped quote must not end the string.

/// Maximum number of bytes scanned ahead of an opening bracket.
pub const MAX_LOOKAHEAD: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

/// Returns the byte index of the bracket closing the one at `start`.
///
/// `{` and `[` both open, `}` and `]` both close; pairing is left to the JSON
/// parser that consumes the slice. Returns `None` when `start` is not an
/// opening bracket or when no close is found within `limit` bytes.
pub fn find_matching_close(text: &str, start: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(start), Some(b'{') | Some(b'[')) {
        return None;
    }
    let end = start.saturating_add(limit).min(bytes.len());

    let mut depth = 0usize;
    let mut state = ScanState::Normal;
    for (offset, &b) in bytes[start..end].iter().enumerate() {
        state = match (state, b) {
            (ScanState::Escaped, _) => ScanState::InString,
            (ScanState::InString, b'\\') => ScanState::Escaped,
            (ScanState::InString, b'"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Normal, b'"') => ScanState::InString,
            (ScanState::Normal, b'{' | b'[') => {
                depth += 1;
                ScanState::Normal
            }
            (ScanState::Normal, b'}' | b']') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
                ScanState::Normal
            }
            (ScanState::Normal, _) => ScanState::Normal,
        };
    }
    None
}

/// Returns the bracket-delimited slice starting at `start`, closing bracket included.
pub fn bracketed_slice(text: &str, start: usize, limit: usize) -> Option<&str> {
    find_matching_close(text, start, limit).map(|end| &text[start..=end])
}

/// Byte offsets of every `{` and `[` in `text`.
pub fn opening_brackets(text: &str) -> Vec<usize> {
    text.bytes()
        .enumerate()
        .filter(|(_, b)| matches!(b, b'{' | b'['))
        .map(|(i, _)| i)
        .collect()
}

/// Byte offsets of every `{` in `text`.
pub fn opening_braces(text: &str) -> Vec<usize> {
    text.bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'{')
        .map(|(i, _)| i)
        .collect()
}
