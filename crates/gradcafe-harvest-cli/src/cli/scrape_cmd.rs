//! `gradcafe scrape`: crawl without storing, emit records as JSON.

use super::output::{self, Styled};
use super::{build_crawler, CrawlArgs};
use anyhow::{Context, Result};
use gradcafe_harvest::{ExportedRecord, HarvestConfig};
use std::path::Path;

pub async fn run(config: &HarvestConfig, args: &CrawlArgs, out: Option<&Path>) -> Result<()> {
    let options = args.options(config);
    let crawler = build_crawler(config)?;
    let report = crawler
        .crawl(&options, None)
        .await
        .context("scrape failed")?;

    let records: Vec<ExportedRecord> = report.records.iter().map(ExportedRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;

    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "output": path.display().to_string(),
                    "records": records.len(),
                    "pages_fetched": report.state.pages_fetched,
                    "pages_skipped": report.pages_skipped,
                    "stop_reason": report.stop_reason,
                }));
            } else if !output::is_quiet() {
                let s = Styled::new();
                output::print_check(
                    s.ok_sym(),
                    "Scraped:",
                    &format!(
                        "{} records from {} page(s) -> {}",
                        records.len(),
                        report.state.pages_fetched,
                        path.display()
                    ),
                );
            }
        }
        None => println!("{json}"),
    }
    Ok(())
}
