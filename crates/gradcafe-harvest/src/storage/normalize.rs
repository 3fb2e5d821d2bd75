//! Scalar normalization applied on the way into storage.

use chrono::NaiveDate;

const DATE_SENTINEL: &str = "Added on ";
const DATE_FORMAT: &str = "%B %d, %Y";

/// Strip NUL and other control bytes SQLite text should not carry, keeping
/// tabs and newlines, then trim.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse an `"Added on <Month> <day>, <year>"` sentinel. Any other shape is `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let text = text.strip_prefix(DATE_SENTINEL).unwrap_or(text).trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Strip a score's label (`"GPA"`, `"GRE V"`, ...) and parse what is left.
///
/// Empty or unparseable text is `None`, never an error.
pub fn parse_score(text: &str, label: &str) -> Option<f64> {
    let text = text.trim();
    let value = match text.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => &text[label.len()..],
        _ => text,
    };
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
