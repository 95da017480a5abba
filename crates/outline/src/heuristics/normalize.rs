//! Line normalization: span joining and canonical whitespace/punctuation
//! spacing. An empty result signals "discard this line".

use std::sync::OnceLock;

use regex::Regex;

use crate::types::TextLine;

/// Canonicalize raw text. Steps, in order:
///
/// 1. Collapse any whitespace run to a single space and trim the ends.
/// 2. Give `:`, `.` and `,` zero spaces before and one space after (the
///    trailing space is dropped again at end of string).
/// 3. Remove whitespace immediately preceding a final `. , : ; ! ?`.
pub fn clean_text(text: &str) -> String {
    static RE_WS: OnceLock<Regex> = OnceLock::new();
    static RE_COLON: OnceLock<Regex> = OnceLock::new();
    static RE_PERIOD: OnceLock<Regex> = OnceLock::new();
    static RE_COMMA: OnceLock<Regex> = OnceLock::new();
    static RE_TRAILING: OnceLock<Regex> = OnceLock::new();

    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let re_colon = RE_COLON.get_or_init(|| Regex::new(r"\s*:\s*").unwrap());
    let re_period = RE_PERIOD.get_or_init(|| Regex::new(r"\s*\.\s*").unwrap());
    let re_comma = RE_COMMA.get_or_init(|| Regex::new(r"\s*,\s*").unwrap());
    let re_trailing = RE_TRAILING.get_or_init(|| Regex::new(r"\s+([.,:;!?])$").unwrap());

    let mut result = re_ws.replace_all(text.trim(), " ").into_owned();
    result = re_colon.replace_all(&result, ": ").into_owned();
    result = re_period.replace_all(&result, ". ").into_owned();
    result = re_comma.replace_all(&result, ", ").into_owned();
    let trimmed_len = result.trim_end().len();
    result.truncate(trimmed_len);
    re_trailing.replace(&result, "$1").into_owned()
}

/// Join a line's span texts into one canonical string.
///
/// Each span is trimmed and empty spans are dropped; the survivors are
/// joined with single spaces and passed through [`clean_text`]. Returns
/// `None` when nothing printable remains.
pub fn normalize_line(line: &TextLine) -> Option<String> {
    let parts: Vec<&str> = line
        .spans
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if parts.is_empty() {
        return None;
    }

    let cleaned = clean_text(&parts.join(" "));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Font sizes of the spans that contribute visible text to the line
/// (spans that trim to empty carry no typographic signal).
pub fn visible_span_sizes(line: &TextLine) -> Vec<f32> {
    line.spans
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| s.size)
        .collect()
}
