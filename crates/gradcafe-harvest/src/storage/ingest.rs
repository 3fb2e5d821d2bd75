//! Ingestion writer: standardize once, attach the identity, insert-or-skip.

use super::store::ApplicantStore;
use crate::cartography::RecordSink;
use crate::error::Result;
use crate::standardize::Standardizer;
use crate::types::{ExportedRecord, RawRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Counts from a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub records: usize,
    pub inserted: usize,
}

/// Owns the store and the standardizer that feeds it.
pub struct Ingestor {
    store: ApplicantStore,
    standardizer: Standardizer,
}

impl Ingestor {
    pub fn new(store: ApplicantStore, standardizer: Standardizer) -> Self {
        Self {
            store,
            standardizer,
        }
    }

    pub fn store(&self) -> &ApplicantStore {
        &self.store
    }

    pub fn standardizer(&self) -> &Standardizer {
        &self.standardizer
    }

    /// Standardize and insert one record.
    ///
    /// Already-stored urls are skipped before standardization so a caught-up
    /// page costs no inference calls.
    pub async fn ingest_record(&mut self, record: &RawRecord) -> Result<bool> {
        let Some(url) = record.url.as_deref() else {
            debug!("record without url not stored: {}", record.program_text);
            return Ok(false);
        };
        if self.store.contains(url)? {
            return Ok(false);
        }

        let identity = self.standardizer.standardize(&record.program_text).await;
        self.store.insert(record, &identity)
    }

    /// Insert every record of an exported JSON array.
    ///
    /// Records carrying both standardized fields keep them; the rest are
    /// standardized here.
    pub async fn load_json(&mut self, path: &Path) -> Result<LoadReport> {
        let text = std::fs::read_to_string(path)?;
        let exported: Vec<ExportedRecord> = serde_json::from_str(&text)?;

        let mut report = LoadReport {
            records: exported.len(),
            inserted: 0,
        };
        for entry in exported {
            let inserted = match entry.into_parts() {
                (record, Some(identity)) => self.store.insert(&record, &identity)?,
                (record, None) => self.ingest_record(&record).await?,
            };
            if inserted {
                report.inserted += 1;
            }
        }

        info!(
            "loaded {} records from {}, {} new",
            report.records,
            path.display(),
            report.inserted
        );
        Ok(report)
    }

    /// Standardize every stored row that has no identity yet.
    pub async fn backfill_identities(&mut self) -> Result<usize> {
        let rows = self.store.rows_missing_identity()?;
        info!("{} rows need standardized names", rows.len());

        let mut updated = 0;
        for (p_id, program) in rows {
            let identity = self.standardizer.standardize(&program).await;
            if self.store.update_identity(p_id, &identity)? {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl RecordSink for Ingestor {
    async fn ingest(&mut self, record: &RawRecord) -> Result<bool> {
        self.ingest_record(record).await
    }
}
