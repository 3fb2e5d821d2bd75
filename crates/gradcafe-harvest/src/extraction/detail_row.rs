//! Classify the fragments of a single-cell detail row.

use crate::types::RawRecord;
use regex::Regex;
use std::sync::LazyLock;

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(fall|spring|summer|winter)\s+\d{4}$").unwrap());

static GPA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^gpa\s+\d+(\.\d+)?$").unwrap());

const STATUS_KEYWORDS: &[&str] = &["accepted", "rejected", "interview", "wait"];
const STATUS_MAX_CHARS: usize = 50;

/// What a detail-row fragment turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Term,
    International,
    American,
    Gpa,
    GreVerbal,
    GreWriting,
    GreQuant,
    Gre,
    Status,
    /// A decision fragment seen after status was already set; dropped.
    StatusRepeat,
    Unclassified,
}

/// Classify one fragment, most specific prefix first so that "GRE AW 4.5"
/// never lands in the generic GRE field.
pub fn classify_fragment(fragment: &str, status_already_set: bool) -> FragmentKind {
    let lower = fragment.to_lowercase();

    if TERM_RE.is_match(&lower) {
        FragmentKind::Term
    } else if lower == "international" {
        FragmentKind::International
    } else if lower == "american" {
        FragmentKind::American
    } else if GPA_RE.is_match(&lower) {
        FragmentKind::Gpa
    } else if lower.starts_with("gre v") {
        FragmentKind::GreVerbal
    } else if lower.starts_with("gre aw") {
        FragmentKind::GreWriting
    } else if lower.starts_with("gre q") {
        FragmentKind::GreQuant
    } else if lower.starts_with("gre") {
        FragmentKind::Gre
    } else if fragment.chars().count() < STATUS_MAX_CHARS
        && STATUS_KEYWORDS.iter().any(|k| lower.contains(k))
    {
        if status_already_set {
            FragmentKind::StatusRepeat
        } else {
            FragmentKind::Status
        }
    } else {
        FragmentKind::Unclassified
    }
}

/// Apply one detail row (already flattened to `" | "`-separated text) to the open record.
pub fn apply_detail_row(text: &str, record: &mut RawRecord) {
    if text.is_empty() {
        return;
    }

    let mut found_structured = false;
    let mut unclassified: Vec<&str> = Vec::new();

    for part in text.split(" | ").map(str::trim) {
        let kind = classify_fragment(part, !record.status.is_empty());
        let field = match kind {
            FragmentKind::Term => &mut record.term,
            FragmentKind::International | FragmentKind::American => {
                record.nationality = if kind == FragmentKind::International {
                    "International".to_string()
                } else {
                    "American".to_string()
                };
                found_structured = true;
                continue;
            }
            FragmentKind::Gpa => &mut record.gpa,
            FragmentKind::GreVerbal => &mut record.gre_v,
            FragmentKind::GreWriting => &mut record.gre_aw,
            FragmentKind::GreQuant => &mut record.gre_q,
            FragmentKind::Gre => &mut record.gre,
            FragmentKind::Status => &mut record.status,
            FragmentKind::StatusRepeat => continue,
            FragmentKind::Unclassified => {
                unclassified.push(part);
                continue;
            }
        };
        *field = part.to_string();
        found_structured = true;
    }

    if !unclassified.is_empty() {
        record.comments.push(unclassified.join(" "));
    }

    // A row with nothing structured is a pure comment row; keep its original
    // text too unless that exact string is already recorded.
    if !found_structured && !record.comments.iter().any(|c| c == text) {
        record.comments.push(text.to_string());
    }
}
