//! SQLite applicant store with insert-or-skip-by-url semantics.

use super::normalize::{clean_text, parse_date, parse_score};
use crate::error::Result;
use crate::types::{PersistedApplicant, RawRecord, StandardizedIdentity};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS applicants (
    p_id INTEGER PRIMARY KEY,
    program TEXT,
    comments TEXT,
    date_added TEXT,
    url TEXT UNIQUE,
    status TEXT,
    term TEXT,
    us_or_international TEXT,
    gpa REAL,
    gre REAL,
    gre_v REAL,
    gre_aw REAL,
    degree TEXT,
    llm_generated_program TEXT,
    llm_generated_university TEXT
);";

const SELECT_COLUMNS: &str = "p_id, url, program, comments, date_added, status, term, \
     us_or_international, gpa, gre, gre_v, gre_aw, degree, \
     llm_generated_program, llm_generated_university";

/// Applicant rows, one per unique result url.
///
/// Every statement commits on its own; there is no crawl-wide transaction.
pub struct ApplicantStore {
    db: Connection,
}

impl ApplicantStore {
    /// Open or create a store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(SCHEMA)?;
        Ok(Self { db })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.db
    }

    /// Normalize and insert `record` unless its url is already stored.
    ///
    /// Returns whether a row was written. Records without a url cannot be
    /// deduplicated and are never written.
    pub fn insert(&self, record: &RawRecord, identity: &StandardizedIdentity) -> Result<bool> {
        let Some(url) = record.url.as_deref().map(clean_text).filter(|u| !u.is_empty()) else {
            debug!("skipping record without result url: {}", record.program_text);
            return Ok(false);
        };

        let date = parse_date(&record.date_added).map(|d| d.format("%Y-%m-%d").to_string());
        let degree = record
            .degree
            .as_ref()
            .map(|d| clean_text(d.as_str()))
            .unwrap_or_default();

        let changed = self.db.execute(
            "INSERT INTO applicants (
                program, comments, date_added, url, status, term, us_or_international,
                gpa, gre, gre_v, gre_aw, degree,
                llm_generated_program, llm_generated_university
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(url) DO NOTHING",
            params![
                clean_text(&record.program_text),
                clean_text(&record.joined_comments()),
                date,
                url,
                clean_text(&record.status),
                clean_text(&record.term),
                clean_text(&record.nationality),
                parse_score(&record.gpa, "GPA"),
                parse_score(&record.gre, "GRE"),
                parse_score(&record.gre_v, "GRE V"),
                parse_score(&record.gre_aw, "GRE AW"),
                degree,
                clean_text(&identity.program),
                clean_text(&identity.university),
            ],
        )?;

        Ok(changed > 0)
    }

    /// Is `url` already stored?
    pub fn contains(&self, url: &str) -> Result<bool> {
        let found = self
            .db
            .query_row(
                "SELECT 1 FROM applicants WHERE url = ?1",
                params![url],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, url: &str) -> Result<Option<PersistedApplicant>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM applicants WHERE url = ?1");
        Ok(self
            .db
            .query_row(&sql, params![url], applicant_from_row)
            .optional()?)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM applicants", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// `(p_id, program)` of rows whose standardized identity is NULL or empty.
    pub fn rows_missing_identity(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.db.prepare(
            "SELECT p_id, COALESCE(program, '') FROM applicants
             WHERE llm_generated_program IS NULL OR llm_generated_program = ''
                OR llm_generated_university IS NULL OR llm_generated_university = ''
             ORDER BY p_id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_identity(&self, p_id: i64, identity: &StandardizedIdentity) -> Result<bool> {
        let changed = self.db.execute(
            "UPDATE applicants
             SET llm_generated_program = ?1, llm_generated_university = ?2
             WHERE p_id = ?3",
            params![
                clean_text(&identity.program),
                clean_text(&identity.university),
                p_id
            ],
        )?;
        Ok(changed > 0)
    }
}

fn applicant_from_row(row: &Row<'_>) -> rusqlite::Result<PersistedApplicant> {
    let date: Option<String> = row.get(4)?;
    Ok(PersistedApplicant {
        p_id: row.get(0)?,
        url: row.get(1)?,
        program: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        comments: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        date_added: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        status: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        term: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        us_or_international: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        gpa: row.get(8)?,
        gre: row.get(9)?,
        gre_v: row.get(10)?,
        gre_aw: row.get(11)?,
        degree: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        std_program: row.get(13)?,
        std_university: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DegreeBucket;

    fn record(url: &str) -> RawRecord {
        RawRecord {
            url: Some(url.to_string()),
            program_text: "Computer Science, Stanford University".into(),
            institution: "Stanford University".into(),
            degree: Some(DegreeBucket::PhD),
            date_added: "Added on January 15, 2026".into(),
            status: "Accepted".into(),
            term: "Fall 2026".into(),
            nationality: "American".into(),
            gpa: "GPA 3.85".into(),
            gre: "GRE 320".into(),
            gre_v: "GRE V 160".into(),
            gre_aw: "GRE AW 4.5".into(),
            gre_q: "GRE Q 165".into(),
            comments: vec!["funded\0".into(), "yay".into()],
        }
    }

    fn identity() -> StandardizedIdentity {
        StandardizedIdentity {
            program: "Computer Science".into(),
            university: "Stanford University".into(),
        }
    }

    #[test]
    fn test_insert_is_idempotent() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let url = "https://www.thegradcafe.com/result/1";
        assert!(store.insert(&record(url), &identity()).unwrap());
        assert!(!store.insert(&record(url), &identity()).unwrap());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.contains(url).unwrap());
    }

    #[test]
    fn test_insert_normalizes_fields() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let url = "https://www.thegradcafe.com/result/2";
        store.insert(&record(url), &identity()).unwrap();

        let row = store.get(url).unwrap().unwrap();
        assert_eq!(row.date_added, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(row.gpa, Some(3.85));
        assert_eq!(row.gre, Some(320.0));
        assert_eq!(row.gre_v, Some(160.0));
        assert_eq!(row.gre_aw, Some(4.5));
        assert_eq!(row.comments, "funded yay");
        assert_eq!(row.degree, "PhD");
        assert_eq!(row.us_or_international, "American");
        assert_eq!(row.std_university.as_deref(), Some("Stanford University"));
    }

    #[test]
    fn test_unparseable_values_become_null() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let url = "https://www.thegradcafe.com/result/3";
        let raw = RawRecord {
            url: Some(url.into()),
            date_added: "Added on yesterday".into(),
            gpa: "GPA ???".into(),
            ..Default::default()
        };
        store.insert(&raw, &identity()).unwrap();
        let row = store.get(url).unwrap().unwrap();
        assert_eq!(row.date_added, None);
        assert_eq!(row.gpa, None);
        assert_eq!(row.gre, None);
    }

    #[test]
    fn test_record_without_url_is_skipped() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let raw = RawRecord {
            url: None,
            ..record("x")
        };
        assert!(!store.insert(&raw, &identity()).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_identity_and_update() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let url = "https://www.thegradcafe.com/result/4";
        let blank = StandardizedIdentity {
            program: String::new(),
            university: String::new(),
        };
        store.insert(&record(url), &blank).unwrap();

        let missing = store.rows_missing_identity().unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].1, "Computer Science, Stanford University");

        assert!(store.update_identity(missing[0].0, &identity()).unwrap());
        assert!(store.rows_missing_identity().unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("applicants.db");
        let store = ApplicantStore::open(&path).unwrap();
        store
            .insert(&record("https://www.thegradcafe.com/result/5"), &identity())
            .unwrap();
        drop(store);

        let reopened = ApplicantStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
