//! `gradcafe backfill`: standardize rows stored without standardized names.

use super::build_ingestor;
use super::output::{self, Styled};
use anyhow::{Context, Result};
use gradcafe_harvest::HarvestConfig;

pub async fn run(config: &HarvestConfig, offline: bool) -> Result<()> {
    let mut ingestor = build_ingestor(config, offline)?;
    let updated = ingestor
        .backfill_identities()
        .await
        .context("backfill failed")?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "updated": updated }));
    } else if !output::is_quiet() {
        let s = Styled::new();
        output::print_check(s.ok_sym(), "Backfilled:", &format!("{updated} rows"));
    }
    Ok(())
}
