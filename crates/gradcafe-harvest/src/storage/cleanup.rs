//! Batch corrections over already-stored rows. Both passes are idempotent.

use super::store::ApplicantStore;
use crate::error::Result;
use crate::standardize::NameTables;
use rusqlite::params;
use serde::Serialize;
use tracing::{debug, info};

/// Counts from one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub invalid_scores: usize,
    pub campus_fixes: usize,
}

/// Null every Analytical Writing score outside 0..=6.
pub fn fix_invalid_scores(store: &ApplicantStore) -> Result<usize> {
    let fixed = store.connection().execute(
        "UPDATE applicants SET gre_aw = NULL WHERE gre_aw > 6 OR gre_aw < 0",
        [],
    )?;
    info!("nulled {fixed} out-of-range GRE AW scores");
    Ok(fixed)
}

/// Re-resolve rows stored under a generic or malformed California name.
///
/// The campus is re-derived from the raw program text, then from the stored
/// name itself; a row is only touched when a specific campus is found and it
/// differs from what is stored.
pub fn fix_campus_names(store: &ApplicantStore, tables: &NameTables) -> Result<usize> {
    let db = store.connection();
    let candidates: Vec<(i64, String, String)> = {
        let mut stmt = db.prepare(
            "SELECT p_id, COALESCE(program, ''), llm_generated_university FROM applicants
             WHERE llm_generated_university LIKE '%University of California%'
                OR llm_generated_university LIKE '%UC %'
                OR llm_generated_university LIKE 'UC%'",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };

    let mut updated = 0;
    for (p_id, program, current) in candidates {
        let Some(campus) = tables
            .campuses
            .find(&program)
            .or_else(|| tables.campuses.find(&current))
        else {
            continue;
        };
        if campus == current {
            continue;
        }
        debug!("p_id {p_id}: {current:?} -> {campus:?}");
        updated += db.execute(
            "UPDATE applicants SET llm_generated_university = ?1 WHERE p_id = ?2",
            params![campus, p_id],
        )?;
    }

    info!("re-resolved {updated} California campus names");
    Ok(updated)
}

/// Score pass, then campus pass.
pub fn run_cleanup(store: &ApplicantStore, tables: &NameTables) -> Result<CleanupReport> {
    Ok(CleanupReport {
        invalid_scores: fix_invalid_scores(store)?,
        campus_fixes: fix_campus_names(store, tables)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawRecord, StandardizedIdentity};

    fn insert(store: &ApplicantStore, id: u32, program: &str, university: &str, aw: &str) {
        let record = RawRecord {
            url: Some(format!("https://www.thegradcafe.com/result/{id}")),
            program_text: program.into(),
            gre_aw: aw.into(),
            ..Default::default()
        };
        let identity = StandardizedIdentity {
            program: "Physics".into(),
            university: university.into(),
        };
        assert!(store.insert(&record, &identity).unwrap());
    }

    #[test]
    fn test_invalid_scores_fixed_once() {
        let store = ApplicantStore::open_in_memory().unwrap();
        insert(&store, 1, "Physics, A", "A", "GRE AW 4.5");
        insert(&store, 2, "Physics, B", "B", "GRE AW 45");
        insert(&store, 3, "Physics, C", "C", "GRE AW -1");

        assert_eq!(fix_invalid_scores(&store).unwrap(), 2);
        assert_eq!(fix_invalid_scores(&store).unwrap(), 0);
        let kept = store
            .get("https://www.thegradcafe.com/result/1")
            .unwrap()
            .unwrap();
        assert_eq!(kept.gre_aw, Some(4.5));
    }

    #[test]
    fn test_campus_names_re_resolved_once() {
        let store = ApplicantStore::open_in_memory().unwrap();
        let tables = NameTables::shared();
        insert(&store, 1, "Physics, UCLA", "University of California", "");
        insert(&store, 2, "Physics, University of California", "University of California", "");
        insert(&store, 3, "Physics, UC Davis", "University of California, Davis", "");
        insert(&store, 4, "Physics, Stanford", "Stanford University", "");
        insert(&store, 5, "Physics", "Uc Santa Cruz", "");

        assert_eq!(fix_campus_names(&store, &tables).unwrap(), 2);
        assert_eq!(fix_campus_names(&store, &tables).unwrap(), 0);

        let university = |id: u32| {
            store
                .get(&format!("https://www.thegradcafe.com/result/{id}"))
                .unwrap()
                .unwrap()
                .std_university
                .unwrap()
        };
        assert_eq!(university(1), "University of California, Los Angeles");
        assert_eq!(university(2), "University of California");
        assert_eq!(university(5), "University of California, Santa Cruz");
    }

    #[test]
    fn test_run_cleanup_reports_both_counts() {
        let store = ApplicantStore::open_in_memory().unwrap();
        insert(&store, 1, "Physics, UC Irvine", "UC Irvine", "GRE AW 7");
        let report = run_cleanup(&store, &NameTables::shared()).unwrap();
        assert_eq!(
            report,
            CleanupReport {
                invalid_scores: 1,
                campus_fixes: 1
            }
        );
    }
}
