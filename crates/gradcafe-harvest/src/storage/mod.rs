//! Persistence: normalization, the SQLite store, ingestion and cleanup passes.

pub mod cleanup;
pub mod ingest;
pub mod normalize;
pub mod store;

pub use cleanup::{fix_campus_names, fix_invalid_scores, run_cleanup, CleanupReport};
pub use ingest::{Ingestor, LoadReport};
pub use store::ApplicantStore;
