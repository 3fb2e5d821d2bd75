//! Core record types shared by the classifier, crawler, standardizer and store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Degree bucket derived from the program cell of a main row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeBucket {
    PhD,
    Masters,
    /// Anything else, kept verbatim (e.g. "JD", "MD", "Other").
    Other(String),
}

impl DegreeBucket {
    /// Bucket a raw degree string.
    ///
    /// Anything containing "phd" is a PhD; anything containing "master" or
    /// exactly one of the common master's abbreviations is Masters.
    pub fn from_text(text: &str) -> Self {
        const MASTERS_ABBREVIATIONS: &[&str] = &["MS", "MA", "MFA", "MBA", "MEng"];

        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();
        if lower.contains("phd") {
            DegreeBucket::PhD
        } else if lower.contains("master") || MASTERS_ABBREVIATIONS.contains(&trimmed) {
            DegreeBucket::Masters
        } else {
            DegreeBucket::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DegreeBucket::PhD => "PhD",
            DegreeBucket::Masters => "Masters",
            DegreeBucket::Other(s) => s,
        }
    }
}

/// One applicant as scraped from a survey page, before normalization.
///
/// Opened by a main row, extended by the detail rows that follow it and
/// closed when the next main row opens or the table ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Absolute result url; the natural key. `None` when the row had no result link.
    pub url: Option<String>,
    /// `"<program>, <institution>"`.
    pub program_text: String,
    pub institution: String,
    pub degree: Option<DegreeBucket>,
    /// `"Added on <text>"`, parsed later by the store.
    pub date_added: String,
    pub status: String,
    pub term: String,
    pub nationality: String,
    pub gpa: String,
    pub gre: String,
    pub gre_v: String,
    pub gre_aw: String,
    pub gre_q: String,
    pub comments: Vec<String>,
}

impl RawRecord {
    /// Comment fragments joined into the single text stored per applicant.
    pub fn joined_comments(&self) -> String {
        self.comments.join(" ").trim().to_string()
    }
}

/// Canonical program/university pair derived from `RawRecord::program_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedIdentity {
    pub program: String,
    pub university: String,
}

/// A stored applicant row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedApplicant {
    pub p_id: i64,
    pub url: String,
    pub program: String,
    pub comments: String,
    pub date_added: Option<NaiveDate>,
    pub status: String,
    pub term: String,
    pub us_or_international: String,
    pub gpa: Option<f64>,
    pub gre: Option<f64>,
    pub gre_v: Option<f64>,
    pub gre_aw: Option<f64>,
    pub degree: String,
    pub std_program: Option<String>,
    pub std_university: Option<String>,
}

/// Flat JSON shape of a record as written by `scrape` and read by `load`.
///
/// Comments are joined into one string. The standardized fields are only
/// present in exports that already carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportedRecord {
    pub program: String,
    pub comments: String,
    pub date_added: String,
    pub url: Option<String>,
    pub status: String,
    pub term: String,
    #[serde(rename = "US/International")]
    pub us_or_international: String,
    #[serde(rename = "GPA")]
    pub gpa: String,
    #[serde(rename = "GRE")]
    pub gre: String,
    #[serde(rename = "GRE V")]
    pub gre_v: String,
    #[serde(rename = "GRE AW")]
    pub gre_aw: String,
    #[serde(rename = "GRE Q")]
    pub gre_q: String,
    #[serde(rename = "Degree")]
    pub degree: String,
    #[serde(rename = "llm-generated-program", skip_serializing_if = "Option::is_none")]
    pub std_program: Option<String>,
    #[serde(rename = "llm-generated-university", skip_serializing_if = "Option::is_none")]
    pub std_university: Option<String>,
}

impl From<&RawRecord> for ExportedRecord {
    fn from(record: &RawRecord) -> Self {
        Self {
            program: record.program_text.clone(),
            comments: record.joined_comments(),
            date_added: record.date_added.clone(),
            url: record.url.clone(),
            status: record.status.clone(),
            term: record.term.clone(),
            us_or_international: record.nationality.clone(),
            gpa: record.gpa.clone(),
            gre: record.gre.clone(),
            gre_v: record.gre_v.clone(),
            gre_aw: record.gre_aw.clone(),
            gre_q: record.gre_q.clone(),
            degree: record
                .degree
                .as_ref()
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            std_program: None,
            std_university: None,
        }
    }
}

impl ExportedRecord {
    /// Back to a raw record, plus the identity if the export carried a usable one.
    pub fn into_parts(self) -> (RawRecord, Option<StandardizedIdentity>) {
        let identity = match (self.std_program, self.std_university) {
            (Some(program), Some(university))
                if !program.trim().is_empty() && !university.trim().is_empty() =>
            {
                Some(StandardizedIdentity {
                    program,
                    university,
                })
            }
            _ => None,
        };
        let degree = self.degree.trim();
        let record = RawRecord {
            url: self.url,
            program_text: self.program,
            institution: String::new(),
            degree: (!degree.is_empty()).then(|| DegreeBucket::from_text(degree)),
            date_added: self.date_added,
            status: self.status,
            term: self.term,
            nationality: self.us_or_international,
            gpa: self.gpa,
            gre: self.gre,
            gre_v: self.gre_v,
            gre_aw: self.gre_aw,
            gre_q: self.gre_q,
            comments: if self.comments.trim().is_empty() {
                Vec::new()
            } else {
                vec![self.comments]
            },
        };
        (record, identity)
    }
}

/// Counters for one crawl invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlState {
    pub pages_fetched: u32,
    pub total_scraped: u64,
    pub total_inserted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_buckets() {
        assert_eq!(DegreeBucket::from_text("PhD"), DegreeBucket::PhD);
        assert_eq!(DegreeBucket::from_text("phd (part time)"), DegreeBucket::PhD);
        assert_eq!(DegreeBucket::from_text("Masters"), DegreeBucket::Masters);
        assert_eq!(DegreeBucket::from_text("MEng"), DegreeBucket::Masters);
        assert_eq!(DegreeBucket::from_text(" MFA "), DegreeBucket::Masters);
        assert_eq!(
            DegreeBucket::from_text("JD"),
            DegreeBucket::Other("JD".to_string())
        );
        assert_eq!(DegreeBucket::from_text("JD").as_str(), "JD");
    }

    #[test]
    fn test_joined_comments() {
        let record = RawRecord {
            comments: vec!["first".into(), "second ".into()],
            ..Default::default()
        };
        assert_eq!(record.joined_comments(), "first second");
        assert_eq!(RawRecord::default().joined_comments(), "");
    }

    #[test]
    fn test_export_shape() {
        let record = RawRecord {
            url: Some("https://www.thegradcafe.com/result/1".into()),
            program_text: "Physics, MIT".into(),
            degree: Some(DegreeBucket::Masters),
            nationality: "International".into(),
            gpa: "GPA 3.9".into(),
            comments: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let value = serde_json::to_value(ExportedRecord::from(&record)).unwrap();
        assert_eq!(value["program"], "Physics, MIT");
        assert_eq!(value["comments"], "a b");
        assert_eq!(value["Degree"], "Masters");
        assert_eq!(value["US/International"], "International");
        assert_eq!(value["GPA"], "GPA 3.9");
        assert!(value.get("llm-generated-program").is_none());
    }

    #[test]
    fn test_import_with_identity_and_missing_fields() {
        let json = r#"{"program": "CS, UBC", "url": "u", "Degree": "PhD",
            "llm-generated-program": "Computer Science",
            "llm-generated-university": "University of British Columbia"}"#;
        let (record, identity) = serde_json::from_str::<ExportedRecord>(json)
            .unwrap()
            .into_parts();
        assert_eq!(record.program_text, "CS, UBC");
        assert_eq!(record.degree, Some(DegreeBucket::PhD));
        assert!(record.comments.is_empty());
        assert_eq!(identity.unwrap().university, "University of British Columbia");

        let (_, identity) = serde_json::from_str::<ExportedRecord>(r#"{"program": "x"}"#)
            .unwrap()
            .into_parts();
        assert!(identity.is_none());
    }
}
