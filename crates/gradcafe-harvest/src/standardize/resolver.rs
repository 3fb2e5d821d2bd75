//! Exact, then fuzzy, matching against a canonical corpus.

use strsim::normalized_levenshtein;

/// Similarity floor for program names.
pub const PROGRAM_THRESHOLD: f64 = 0.84;
/// Similarity floor for university names.
pub const UNIVERSITY_THRESHOLD: f64 = 0.86;

/// How a candidate was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Exact(&'a str),
    Fuzzy { name: &'a str, score: f64 },
}

impl<'a> Resolution<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Resolution::Exact(name) | Resolution::Fuzzy { name, .. } => name,
        }
    }
}

/// One canonical corpus plus the similarity threshold used against it.
///
/// Matching is case-insensitive; the canonical spelling is always returned.
#[derive(Debug, Clone)]
pub struct CanonicalResolver {
    names: Vec<String>,
    lowered: Vec<String>,
    threshold: f64,
}

impl CanonicalResolver {
    pub fn new<I, S>(names: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| {
                let n: String = n.into();
                n.trim().to_string()
            })
            .filter(|n| !n.is_empty())
            .collect();
        let lowered = names.iter().map(|n| n.to_lowercase()).collect();
        Self {
            names,
            lowered,
            threshold,
        }
    }

    /// Build from a newline-separated list, ignoring blanks and `#` lines.
    pub fn from_lines(text: &str, threshold: f64) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
            threshold,
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve `candidate`: exact match wins, else the closest name scoring at
    /// least the threshold, else `None`.
    pub fn resolve(&self, candidate: &str) -> Option<Resolution<'_>> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        if let Some(i) = self.lowered.iter().position(|n| *n == candidate) {
            return Some(Resolution::Exact(&self.names[i]));
        }

        let (best, score) = self
            .lowered
            .iter()
            .enumerate()
            .map(|(i, n)| (i, normalized_levenshtein(&candidate, n)))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        (score >= self.threshold).then(|| Resolution::Fuzzy {
            name: &self.names[best],
            score,
        })
    }

    /// Canonical name for `candidate`, or `candidate` itself when unresolved.
    pub fn canonicalize(&self, candidate: &str) -> String {
        self.resolve(candidate)
            .map(|r| r.name().to_string())
            .unwrap_or_else(|| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universities() -> CanonicalResolver {
        CanonicalResolver::from_lines(
            "# comment\nStanford University\n\nMcGill University\nUniversity of Toronto\n",
            UNIVERSITY_THRESHOLD,
        )
    }

    #[test]
    fn test_exact_is_case_insensitive() {
        let resolver = universities();
        assert_eq!(resolver.len(), 3);
        assert_eq!(
            resolver.resolve("mcgill university"),
            Some(Resolution::Exact("McGill University"))
        );
    }

    #[test]
    fn test_fuzzy_above_threshold() {
        let resolver = universities();
        let resolution = resolver.resolve("Stanfrod University").unwrap();
        assert_eq!(resolution.name(), "Stanford University");
        assert!(matches!(resolution, Resolution::Fuzzy { score, .. } if score >= 0.86));
    }

    #[test]
    fn test_below_threshold_keeps_candidate() {
        let resolver = universities();
        assert_eq!(resolver.resolve("Tokyo Institute"), None);
        assert_eq!(resolver.canonicalize("Tokyo Institute"), "Tokyo Institute");
        assert_eq!(resolver.resolve("   "), None);
    }

    #[test]
    fn test_empty_corpus_never_resolves() {
        let resolver = CanonicalResolver::new(Vec::<String>::new(), PROGRAM_THRESHOLD);
        assert!(resolver.is_empty());
        assert_eq!(resolver.resolve("Physics"), None);
    }
}
