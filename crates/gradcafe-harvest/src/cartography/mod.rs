//! Crawl control: robots policy, politeness delay, pagination and the page loop.

pub mod crawler;
pub mod pagination;
pub mod rate_limiter;
pub mod robots;

pub use crawler::{
    CrawlOptions, CrawlReport, Crawler, RecordSink, StopReason, DEFAULT_BASE_URL,
};
pub use pagination::last_page_number;
pub use robots::RobotsPolicy;
