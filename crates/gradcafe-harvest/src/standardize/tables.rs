//! Canonical corpora and correction tables.
//!
//! The default tables are compiled into the binary. A directory holding any of
//! `canon_universities.txt`, `canon_programs.txt` and `name_tables.json`
//! replaces the corresponding embedded file.

use super::resolver::{CanonicalResolver, PROGRAM_THRESHOLD, UNIVERSITY_THRESHOLD};
use crate::error::{HarvestError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const UNIVERSITIES_TXT: &str = include_str!("../../data/canon_universities.txt");
const PROGRAMS_TXT: &str = include_str!("../../data/canon_programs.txt");
const NAME_TABLES_JSON: &str = include_str!("../../data/name_tables.json");

#[derive(Debug, Deserialize)]
struct PatternEntry {
    pattern: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TablesFile {
    #[serde(default)]
    university_abbreviations: Vec<PatternEntry>,
    #[serde(default)]
    university_fixes: HashMap<String, String>,
    #[serde(default)]
    program_fixes: HashMap<String, String>,
    #[serde(default)]
    campus_patterns: Vec<PatternEntry>,
}

/// Ordered regex table; the first matching pattern names the result.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    entries: Vec<(Regex, String)>,
}

impl PatternTable {
    fn compile(entries: Vec<PatternEntry>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|e| {
                Regex::new(&e.pattern)
                    .map(|re| (re, e.name))
                    .map_err(|err| HarvestError::Tables(format!("pattern {:?}: {err}", e.pattern)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Name of the first pattern matching `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whole-string replacement table, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct FixTable {
    fixes: HashMap<String, String>,
}

impl FixTable {
    fn new(fixes: HashMap<String, String>) -> Self {
        Self {
            fixes: fixes
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        }
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.fixes
            .get(&text.trim().to_lowercase())
            .map(String::as_str)
    }

    /// The fix for `text`, or `text` unchanged.
    pub fn apply(&self, text: &str) -> String {
        self.get(text).unwrap_or(text).to_string()
    }
}

/// Everything the standardizer matches against, built once and shared.
#[derive(Debug, Clone)]
pub struct NameTables {
    pub university_abbreviations: PatternTable,
    pub university_fixes: FixTable,
    pub program_fixes: FixTable,
    /// Ordered campus nickname/city patterns for California names.
    pub campuses: PatternTable,
    pub universities: CanonicalResolver,
    pub programs: CanonicalResolver,
}

impl Default for NameTables {
    fn default() -> Self {
        Self {
            university_abbreviations: PatternTable::default(),
            university_fixes: FixTable::default(),
            program_fixes: FixTable::default(),
            campuses: PatternTable::default(),
            universities: CanonicalResolver::new(Vec::<String>::new(), UNIVERSITY_THRESHOLD),
            programs: CanonicalResolver::new(Vec::<String>::new(), PROGRAM_THRESHOLD),
        }
    }
}

impl NameTables {
    /// Build from file contents.
    pub fn from_sources(universities: &str, programs: &str, tables_json: &str) -> Result<Self> {
        let file: TablesFile = serde_json::from_str(tables_json)
            .map_err(|e| HarvestError::Tables(format!("name_tables.json: {e}")))?;

        Ok(Self {
            university_abbreviations: PatternTable::compile(file.university_abbreviations)?,
            university_fixes: FixTable::new(file.university_fixes),
            program_fixes: FixTable::new(file.program_fixes),
            campuses: PatternTable::compile(file.campus_patterns)?,
            universities: CanonicalResolver::from_lines(universities, UNIVERSITY_THRESHOLD),
            programs: CanonicalResolver::from_lines(programs, PROGRAM_THRESHOLD),
        })
    }

    /// The tables compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_sources(UNIVERSITIES_TXT, PROGRAMS_TXT, NAME_TABLES_JSON)
    }

    /// Load from `dir`, using the embedded copy of any file it lacks.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str, fallback: &'static str| -> Result<String> {
            let path = dir.join(name);
            if path.exists() {
                debug!("loading {}", path.display());
                Ok(std::fs::read_to_string(path)?)
            } else {
                Ok(fallback.to_string())
            }
        };

        Self::from_sources(
            &read("canon_universities.txt", UNIVERSITIES_TXT)?,
            &read("canon_programs.txt", PROGRAMS_TXT)?,
            &read("name_tables.json", NAME_TABLES_JSON)?,
        )
    }

    /// Process-wide embedded tables, built on first use.
    pub fn shared() -> Arc<NameTables> {
        static SHARED: OnceLock<Arc<NameTables>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                Arc::new(Self::embedded().unwrap_or_else(|e| {
                    warn!("embedded name tables unusable: {e}");
                    Self::default()
                }))
            })
            .clone()
    }

    /// `from_dir` when an override directory is configured, else `shared`.
    pub fn load(dir: Option<&Path>) -> Result<Arc<NameTables>> {
        match dir {
            Some(dir) => Ok(Arc::new(Self::from_dir(dir)?)),
            None => Ok(Self::shared()),
        }
    }
}
