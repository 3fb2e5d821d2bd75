//! Deterministic split used when inference is unavailable or unusable.

use super::tables::NameTables;
use super::text::{collapse_whitespace, title_case, university_case};
use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),|\s+at\s+|@").unwrap());

/// Split free text into `(program, university)`.
///
/// The first segment is the program and the second the university. A lone
/// segment that is a known university abbreviation ("MIT") is taken as the
/// university with no program.
pub fn split_fallback(text: &str, tables: &NameTables) -> (String, String) {
    let cleaned = collapse_whitespace(text);
    let cleaned = cleaned.trim_matches(|c: char| c == ',' || c.is_whitespace());

    let mut parts = SEPARATOR_RE
        .split(cleaned)
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let first = parts.next().unwrap_or("");
    let second = parts.next();

    let (program, university) = match second {
        Some(university) => (first, university),
        None if tables.university_abbreviations.find(first).is_some() => ("", first),
        None => (first, ""),
    };

    let university = match tables.university_abbreviations.find(university) {
        Some(expanded) => expanded.to_string(),
        None => university_case(university),
    };
    (title_case(program), university)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> (String, String) {
        split_fallback(text, &NameTables::shared())
    }

    #[test]
    fn test_comma_split() {
        assert_eq!(
            split("computer science, Stanford University"),
            ("Computer Science".into(), "Stanford University".into())
        );
    }

    #[test]
    fn test_at_and_at_sign() {
        assert_eq!(split("Physics at UBC").1, "University of British Columbia");
        assert_eq!(split("Physics @ McG").1, "McGill University");
        assert_eq!(split("Physics at UBC").0, "Physics");
    }

    #[test]
    fn test_single_abbreviation_is_university() {
        assert_eq!(
            split("MIT"),
            (String::new(), "Massachusetts Institute of Technology".into())
        );
        assert_eq!(split("chemistry"), ("Chemistry".into(), String::new()));
    }

    #[test]
    fn test_empty_and_separator_only() {
        assert_eq!(split(""), (String::new(), String::new()));
        assert_eq!(split(" , , "), (String::new(), String::new()));
    }
}
