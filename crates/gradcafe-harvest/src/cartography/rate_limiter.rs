//! Politeness delay between sequential page fetches.

use std::time::Duration;
use tracing::info;

/// Enforces the crawl delay between two page fetches.
///
/// Pages are fetched one at a time, so this is a plain pause rather than a
/// concurrency limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    /// Create a limiter that pauses for `delay` between pages.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Combine the caller's requested delay with a robots.txt Crawl-delay.
    ///
    /// The stricter (longer) of the two wins.
    pub fn from_crawl_delay(requested: Duration, suggested: Option<Duration>) -> Self {
        match suggested {
            Some(robots_delay) if robots_delay > requested => {
                info!(
                    "using crawl delay from robots.txt: {:.2}s",
                    robots_delay.as_secs_f64()
                );
                Self::new(robots_delay)
            }
            _ => Self::new(requested),
        }
    }

    /// The effective delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay before the next fetch.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
