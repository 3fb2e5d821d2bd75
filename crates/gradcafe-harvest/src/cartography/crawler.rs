//! Sequential survey crawler.

use crate::acquisition::PageFetcher;
use crate::cartography::pagination::{last_page_number, page_url};
use crate::cartography::rate_limiter::RateLimiter;
use crate::cartography::robots::RobotsPolicy;
use crate::error::{HarvestError, Result};
use crate::extraction::SurveyParser;
use crate::types::{CrawlState, RawRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Survey listing crawled by default.
pub const DEFAULT_BASE_URL: &str = "https://www.thegradcafe.com/survey/";

/// Where crawled records go while the crawl runs.
///
/// The sink's answer drives the catch-up stop: a page whose records were all
/// already stored ends the crawl.
#[async_trait]
pub trait RecordSink: Send {
    /// Persist one record, returning whether it was new.
    async fn ingest(&mut self, record: &RawRecord) -> Result<bool>;
}

/// Parameters of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub base_url: String,
    /// Highest page number that may be fetched.
    pub page_cap: u32,
    /// Requested pause between pages; robots.txt may lengthen it.
    pub delay: Duration,
    /// Skip the robots.txt check entirely.
    pub bypass_policy: bool,
    /// Lower the cap to the last page linked from page 1.
    pub respect_pagination: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_cap: 10,
            delay: Duration::from_millis(500),
            bypass_policy: false,
            respect_pagination: true,
        }
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// robots.txt disallows the base url; nothing was fetched.
    PolicyDenied,
    /// A fetched page parsed to zero records.
    EmptyPage,
    /// A page contributed no new rows to the sink.
    CaughtUp,
    /// The page cap (or the last linked page) was reached.
    PageCap,
}

/// Result and telemetry of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<RawRecord>,
    pub state: CrawlState,
    pub effective_delay: Duration,
    pub stop_reason: StopReason,
    /// Pages passed over because robots.txt disallows their url.
    pub pages_skipped: u32,
}

impl CrawlReport {
    fn denied() -> Self {
        Self {
            records: Vec::new(),
            state: CrawlState::default(),
            effective_delay: Duration::ZERO,
            stop_reason: StopReason::PolicyDenied,
            pages_skipped: 0,
        }
    }
}

/// Drives fetcher, robots policy and row parser across survey pages.
///
/// Holds no state between invocations. Running two crawls into the same
/// store at once is not guarded here.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Crawl from page 1 until a page is empty, the sink reports a caught-up
    /// page, or the cap is reached.
    ///
    /// Fetch failures skip the page. Only an unparseable base url and sink
    /// (storage) failures are returned as errors.
    pub async fn crawl(
        &self,
        options: &CrawlOptions,
        mut sink: Option<&mut dyn RecordSink>,
    ) -> Result<CrawlReport> {
        let base = Url::parse(&options.base_url).map_err(|e| HarvestError::Url {
            url: options.base_url.clone(),
            reason: e.to_string(),
        })?;
        let parser = SurveyParser::new(&base.origin().ascii_serialization());

        let policy = if options.bypass_policy {
            info!("robots.txt check bypassed");
            None
        } else {
            let policy = RobotsPolicy::load(self.fetcher.as_ref(), &options.base_url).await?;
            if !policy.allows(&options.base_url) {
                warn!("robots.txt disallows {}, aborting crawl", options.base_url);
                return Ok(CrawlReport::denied());
            }
            Some(policy)
        };

        let limiter = RateLimiter::from_crawl_delay(
            options.delay,
            policy.as_ref().and_then(RobotsPolicy::crawl_delay),
        );

        let mut state = CrawlState::default();
        let mut records = Vec::new();
        let mut pages_skipped = 0;
        let mut last_page = options.page_cap;
        let mut stop_reason = StopReason::PageCap;

        for page in 1..=options.page_cap {
            if page > last_page {
                break;
            }
            let url = page_url(&options.base_url, page);

            if page > 1 {
                limiter.pause().await;
                if let Some(policy) = &policy {
                    if !policy.allows(&url) {
                        info!("robots.txt disallows page {page}, skipping");
                        pages_skipped += 1;
                        continue;
                    }
                }
            }

            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("page {page} failed ({e}), skipping");
                    continue;
                }
            };
            state.pages_fetched += 1;

            if page == 1 && options.respect_pagination {
                last_page = last_page.min(last_page_number(&html));
                debug!("pagination ends at page {last_page}");
            }

            let page_records = parser.parse(&html);
            if page_records.is_empty() {
                info!("page {page} has no records, stopping");
                stop_reason = StopReason::EmptyPage;
                break;
            }
            state.total_scraped += page_records.len() as u64;

            let mut caught_up = false;
            if let Some(sink) = sink.as_deref_mut() {
                let mut inserted = 0u64;
                for record in &page_records {
                    if sink.ingest(record).await? {
                        inserted += 1;
                    }
                }
                state.total_inserted += inserted;
                info!(
                    "page {page}: {} scraped, {inserted} new",
                    page_records.len()
                );
                caught_up = inserted == 0;
            } else {
                info!("page {page}: {} scraped", page_records.len());
            }

            records.extend(page_records);
            if caught_up {
                info!("page {page} added nothing new, caught up");
                stop_reason = StopReason::CaughtUp;
                break;
            }
        }

        info!(
            "crawl finished ({stop_reason:?}): {} pages, {} scraped, {} inserted",
            state.pages_fetched, state.total_scraped, state.total_inserted
        );

        Ok(CrawlReport {
            records,
            state,
            effective_delay: limiter.delay(),
            stop_reason,
            pages_skipped,
        })
    }
}
