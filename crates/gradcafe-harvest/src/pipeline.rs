//! Crawl-until-caught-up followed by cleanup, as one pull.

use crate::cartography::{CrawlOptions, Crawler, RecordSink, StopReason};
use crate::error::Result;
use crate::storage::{run_cleanup, CleanupReport, Ingestor};
use serde::Serialize;
use tracing::info;

/// Outcome of one pull.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullSummary {
    pub pages_fetched: u32,
    pub scraped: u64,
    pub inserted: u64,
    pub pages_skipped: u32,
    pub cleaned_gre_aw: usize,
    pub cleaned_uc: usize,
    pub stop_reason: StopReason,
    pub message: String,
}

/// Crawl into `ingestor`'s store, then run the cleanup passes if anything new
/// was stored.
pub async fn pull(
    crawler: &Crawler,
    options: &CrawlOptions,
    ingestor: &mut Ingestor,
) -> Result<PullSummary> {
    let sink: &mut dyn RecordSink = &mut *ingestor;
    let report = crawler.crawl(options, Some(sink)).await?;
    let state = report.state;

    let cleanup = if state.total_inserted > 0 {
        info!("running cleanup over new rows");
        run_cleanup(ingestor.store(), ingestor.standardizer().tables())?
    } else {
        CleanupReport::default()
    };

    let message = pull_message(
        report.stop_reason,
        state.pages_fetched,
        state.total_scraped,
        state.total_inserted,
        &cleanup,
    );
    info!("{message}");

    Ok(PullSummary {
        pages_fetched: state.pages_fetched,
        scraped: state.total_scraped,
        inserted: state.total_inserted,
        pages_skipped: report.pages_skipped,
        cleaned_gre_aw: cleanup.invalid_scores,
        cleaned_uc: cleanup.campus_fixes,
        stop_reason: report.stop_reason,
        message,
    })
}

fn pull_message(
    stop_reason: StopReason,
    pages: u32,
    scraped: u64,
    inserted: u64,
    cleanup: &CleanupReport,
) -> String {
    if stop_reason == StopReason::PolicyDenied {
        return "robots.txt disallows crawling this site; nothing fetched.".to_string();
    }
    if inserted == 0 {
        return format!("Already up to date. Checked {pages} page(s), no new entries found.");
    }
    let mut message = format!(
        "Caught up! Scraped {pages} page(s), {scraped} entries checked, {inserted} new rows added."
    );
    if cleanup.invalid_scores > 0 || cleanup.campus_fixes > 0 {
        message.push_str(&format!(
            " Cleaned: {} GRE AW, {} UC names.",
            cleanup.invalid_scores, cleanup.campus_fixes
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let none = CleanupReport::default();
        assert_eq!(
            pull_message(StopReason::CaughtUp, 1, 20, 0, &none),
            "Already up to date. Checked 1 page(s), no new entries found."
        );
        assert_eq!(
            pull_message(StopReason::CaughtUp, 3, 60, 41, &none),
            "Caught up! Scraped 3 page(s), 60 entries checked, 41 new rows added."
        );
        let cleaned = CleanupReport {
            invalid_scores: 2,
            campus_fixes: 0,
        };
        assert!(pull_message(StopReason::PageCap, 3, 60, 41, &cleaned)
            .ends_with("Cleaned: 2 GRE AW, 0 UC names."));
        assert!(pull_message(StopReason::PolicyDenied, 0, 0, 0, &none).contains("robots.txt"));
    }
}
