//! GradCafe Harvest: polite survey crawling, row classification, name
//! standardization and deduplicated SQLite storage for applicant results.

pub mod acquisition;
pub mod audit;
pub mod cartography;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod standardize;
pub mod storage;
pub mod types;

pub use acquisition::{HttpFetcher, PageFetcher};
pub use cartography::{CrawlOptions, CrawlReport, Crawler, RecordSink, StopReason};
pub use config::HarvestConfig;
pub use error::{FetchError, HarvestError, InferenceError, Result};
pub use extraction::parse_page;
pub use pipeline::{pull, PullSummary};
pub use standardize::{Inference, NameTables, OllamaInference, Standardizer};
pub use storage::{ApplicantStore, CleanupReport, Ingestor};
pub use types::{
    CrawlState, DegreeBucket, ExportedRecord, PersistedApplicant, RawRecord, StandardizedIdentity,
};
