//! `gradcafe cleanup`: run both cleanup passes over the database.

use super::output::{self, Styled};
use super::{load_tables, open_store};
use anyhow::{Context, Result};
use gradcafe_harvest::storage::run_cleanup;
use gradcafe_harvest::HarvestConfig;

pub fn run(config: &HarvestConfig) -> Result<()> {
    let store = open_store(config)?;
    let tables = load_tables(config)?;
    let report = run_cleanup(&store, &tables).context("cleanup failed")?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(report)?);
    } else if !output::is_quiet() {
        let s = Styled::new();
        output::print_check(
            s.ok_sym(),
            "GRE AW:",
            &format!("{} out-of-range scores nulled", report.invalid_scores),
        );
        output::print_check(
            s.ok_sym(),
            "UC campuses:",
            &format!("{} names re-resolved", report.campus_fixes),
        );
    }
    Ok(())
}
