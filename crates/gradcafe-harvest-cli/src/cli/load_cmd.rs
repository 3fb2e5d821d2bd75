//! `gradcafe load <file>`: bulk insert an exported JSON array.

use super::build_ingestor;
use super::output::{self, Styled};
use anyhow::{Context, Result};
use gradcafe_harvest::HarvestConfig;
use std::path::Path;

pub async fn run(config: &HarvestConfig, file: &Path, offline: bool) -> Result<()> {
    let mut ingestor = build_ingestor(config, offline)?;
    let report = ingestor
        .load_json(file)
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(report)?);
    } else if !output::is_quiet() {
        let s = Styled::new();
        output::print_check(
            s.ok_sym(),
            "Loaded:",
            &format!(
                "{} new of {} records into {}",
                report.inserted,
                report.records,
                config.db_path.display()
            ),
        );
    }
    Ok(())
}
