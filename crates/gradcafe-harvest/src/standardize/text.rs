//! Casing and cleanup helpers for free-text names.

use regex::Regex;
use std::sync::LazyLock;

static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([A-Za-z]+\)\s*$").unwrap());
static TITLE_OF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bOf\b").unwrap());

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word title-casing: a letter is uppercased when the previous character is
/// not a letter, lowercased otherwise (`"o'neil"` -> `"O'Neil"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Title-case a university name only when it carries no casing information
/// of its own (all lower or all upper). "McGill" and "UC Berkeley" survive.
pub fn university_case(text: &str) -> String {
    let has_lower = text.chars().any(char::is_lowercase);
    let has_upper = text.chars().any(char::is_uppercase);
    let cased = if has_lower && has_upper {
        text.to_string()
    } else {
        title_case(text)
    };
    TITLE_OF_RE.replace_all(&cased, "of").into_owned()
}

/// Drop a trailing `(ABBR)` such as `"(MIT)"`.
pub fn strip_trailing_parenthetical(text: &str) -> String {
    TRAILING_PAREN_RE.replace(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("computer science"), "Computer Science");
        assert_eq!(title_case("ELECTRICAL ENGINEERING"), "Electrical Engineering");
        assert_eq!(title_case("o'neil school"), "O'Neil School");
        assert_eq!(title_case("bio-statistics"), "Bio-Statistics");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_university_case_keeps_mixed_case() {
        assert_eq!(university_case("McGill University"), "McGill University");
        assert_eq!(university_case("stanford university"), "Stanford University");
        assert_eq!(
            university_case("UNIVERSITY OF TORONTO"),
            "University of Toronto"
        );
        assert_eq!(
            university_case("University Of British Columbia"),
            "University of British Columbia"
        );
    }

    #[test]
    fn test_strip_trailing_parenthetical() {
        assert_eq!(
            strip_trailing_parenthetical("Massachusetts Institute of Technology (MIT)"),
            "Massachusetts Institute of Technology"
        );
        assert_eq!(strip_trailing_parenthetical("A (B) C"), "A (B) C");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n c "), "a b c");
    }
}
