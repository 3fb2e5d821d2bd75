//! CLI command implementations.

pub mod backfill_cmd;
pub mod cleanup_cmd;
pub mod load_cmd;
pub mod output;
pub mod pull_cmd;
pub mod scrape_cmd;
pub mod standardize_cmd;

use anyhow::{Context, Result};
use clap::Args;
use gradcafe_harvest::{
    ApplicantStore, CrawlOptions, Crawler, HarvestConfig, HttpFetcher, Ingestor, NameTables,
    OllamaInference, Standardizer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Crawl flags shared by `scrape` and `pull`.
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Survey listing url (default: $GRADCAFE_BASE_URL or the public survey)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Highest page number to fetch
    #[arg(long, default_value_t = 10)]
    pub pages: u32,

    /// Seconds between pages (robots.txt may raise it)
    #[arg(long)]
    pub delay: Option<f64>,

    /// Do not consult robots.txt
    #[arg(long)]
    pub ignore_robots: bool,

    /// Do not lower the page cap to the last page linked from page 1
    #[arg(long)]
    pub all_pages: bool,
}

impl CrawlArgs {
    pub fn options(&self, config: &HarvestConfig) -> CrawlOptions {
        CrawlOptions {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| config.base_url.clone()),
            page_cap: self.pages,
            delay: self
                .delay
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(Duration::from_secs_f64)
                .unwrap_or(config.delay),
            bypass_policy: self.ignore_robots,
            respect_pagination: !self.all_pages,
        }
    }
}

pub fn build_crawler(config: &HarvestConfig) -> Result<Crawler> {
    let fetcher = HttpFetcher::new(&config.user_agent, config.http_timeout)
        .context("failed to build HTTP client")?;
    Ok(Crawler::new(Arc::new(fetcher)))
}

pub fn open_store(config: &HarvestConfig) -> Result<ApplicantStore> {
    ApplicantStore::open(&config.db_path)
        .with_context(|| format!("failed to open database: {}", config.db_path.display()))
}

pub fn load_tables(config: &HarvestConfig) -> Result<Arc<NameTables>> {
    NameTables::load(config.tables_dir.as_deref()).context("failed to load name tables")
}

/// Standardizer with inference attached when a server is configured and
/// `offline` is not set.
pub fn build_standardizer(config: &HarvestConfig, offline: bool) -> Result<Standardizer> {
    let standardizer = Standardizer::new(load_tables(config)?);
    match (&config.ollama_url, offline) {
        (Some(url), false) => {
            info!("standardizing with inference server at {url}");
            let inference =
                OllamaInference::new(url, config.ollama_model.clone(), config.inference_timeout)
                    .context("failed to build inference client")?;
            Ok(standardizer.with_inference(Arc::new(inference)))
        }
        _ => Ok(standardizer),
    }
}

pub fn build_ingestor(config: &HarvestConfig, offline: bool) -> Result<Ingestor> {
    Ok(Ingestor::new(
        open_store(config)?,
        build_standardizer(config, offline)?,
    ))
}
