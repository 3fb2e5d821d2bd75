//! Name standardization: free-text "program, university" to a canonical pair.
//!
//! An optional inference call proposes the split; the deterministic fallback
//! takes over whenever that call fails or its answer cannot be read. Both
//! paths then go through the same post-normalization against the canonical
//! corpora, so the result never depends on inference being available.

pub mod fallback;
pub mod inference;
pub mod resolver;
pub mod tables;
pub mod text;

pub use inference::{Inference, OllamaInference};
pub use resolver::{CanonicalResolver, Resolution};
pub use tables::NameTables;

use crate::types::StandardizedIdentity;
use std::sync::Arc;
use text::{collapse_whitespace, strip_trailing_parenthetical, title_case, university_case};
use tracing::{debug, warn};

/// Sentinel for a university that could not be determined.
pub const UNKNOWN_UNIVERSITY: &str = "Unknown";

/// Does this university text refer to the California system?
pub fn looks_californian(university: &str) -> bool {
    let lower = university.trim().to_lowercase();
    lower.contains("california") || lower.starts_with("uc")
}

/// Resolves free text into a [`StandardizedIdentity`]. Never fails.
pub struct Standardizer {
    tables: Arc<NameTables>,
    inference: Option<Arc<dyn Inference>>,
}

impl Standardizer {
    /// Fallback-only standardizer.
    pub fn new(tables: Arc<NameTables>) -> Self {
        Self {
            tables,
            inference: None,
        }
    }

    /// Try `inference` first on every call.
    pub fn with_inference(mut self, inference: Arc<dyn Inference>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn tables(&self) -> &NameTables {
        &self.tables
    }

    /// Standardize `text`, asking the inference capability first when one is
    /// configured.
    pub async fn standardize(&self, text: &str) -> StandardizedIdentity {
        let (program, university) = match self.infer_split(text).await {
            Some(split) => split,
            None => fallback::split_fallback(text, &self.tables),
        };
        self.finish(&program, &university)
    }

    async fn infer_split(&self, text: &str) -> Option<(String, String)> {
        let inference = self.inference.as_ref()?;
        match inference.infer(&inference::build_prompt(text)).await {
            Ok(response) => {
                let split = inference::scan_response(&response);
                if split.is_none() {
                    warn!("unreadable inference output for {text:?}, using fallback");
                }
                split
            }
            Err(e) => {
                warn!("inference failed ({e}), using fallback");
                None
            }
        }
    }

    fn finish(&self, program: &str, university: &str) -> StandardizedIdentity {
        let identity = StandardizedIdentity {
            program: self.normalize_program(program),
            university: self.normalize_university(university),
        };
        debug!(
            "standardized to {:?} / {:?}",
            identity.program, identity.university
        );
        identity
    }

    /// Typo fixes, title-casing, then canonical program matching.
    pub fn normalize_program(&self, program: &str) -> String {
        let program = collapse_whitespace(program);
        let program = self.tables.program_fixes.apply(&program);
        let program = title_case(&program);
        self.tables.programs.canonicalize(&program)
    }

    /// Abbreviations and spelling fixes, then campus patterns for California
    /// names, then parenthetical stripping, casing and canonical matching.
    pub fn normalize_university(&self, university: &str) -> String {
        let tables = &self.tables;
        let mut name = collapse_whitespace(university);

        if let Some(expanded) = tables.university_abbreviations.find(&name) {
            name = expanded.to_string();
        }
        name = tables.university_fixes.apply(&name);

        // A campus named only inside the parenthetical still counts.
        if looks_californian(&name) {
            if let Some(campus) = tables.campuses.find(&name) {
                return campus.to_string();
            }
        }

        let name = university_case(&strip_trailing_parenthetical(&name));
        if name.is_empty() {
            return UNKNOWN_UNIVERSITY.to_string();
        }
        tables.universities.canonicalize(&name)
    }
}
