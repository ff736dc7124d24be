//! Export history ledger
//!
//! Append-only record of finished export jobs under the `exportHistory` key.
//! There is no update or delete API.

use crate::adapters::store::{JsonCollection, KeyValueStore};
use crate::domain::{ExportHistoryRecord, HistoryStatus, Result};
use std::sync::Arc;

/// Store key holding the ledger
pub const HISTORY_KEY: &str = "exportHistory";

/// Aggregate counts over the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub records_exported: usize,
}

impl HistorySummary {
    /// Percentage of successful jobs (100 for an empty ledger)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total as f64) * 100.0
    }
}

#[derive(Clone)]
pub struct ExportHistoryLedger {
    records: JsonCollection<ExportHistoryRecord>,
}

impl ExportHistoryLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, max_attempts: usize) -> Self {
        Self {
            records: JsonCollection::new(store, HISTORY_KEY).with_max_attempts(max_attempts),
        }
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or concurrent writers exhaust the
    /// retry budget.
    pub async fn append(&self, record: ExportHistoryRecord) -> Result<()> {
        let job_id = record.id.clone();
        let status = record.status;
        self.records
            .update(move |items| items.push(record.clone()))
            .await?;

        tracing::debug!(job_id = %job_id, status = %status, "History record appended");
        Ok(())
    }

    /// All records, most recent first
    pub async fn list(&self) -> Result<Vec<ExportHistoryRecord>> {
        let mut records = self.records.load().await?;
        // Stable sort keeps later appends first among equal timestamps
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    pub async fn summary(&self) -> Result<HistorySummary> {
        let records = self.records.load().await?;
        Ok(records
            .iter()
            .fold(HistorySummary::default(), |mut summary, record| {
                summary.total += 1;
                match record.status {
                    HistoryStatus::Success => {
                        summary.successful += 1;
                        summary.records_exported += record.records_exported;
                    }
                    HistoryStatus::Failed => summary.failed += 1,
                }
                summary
            }))
    }
}
