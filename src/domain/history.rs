//! Export history records
//!
//! One [`ExportHistoryRecord`] is appended per terminal job transition and is
//! never modified afterwards.

use super::ids::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an export was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Manual,
    Scheduled,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::Manual => f.pad("Manual"),
            JobType::Scheduled => f.pad("Scheduled"),
        }
    }
}

/// Outcome recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryStatus {
    Success,
    Failed,
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Success => f.pad("Success"),
            HistoryStatus::Failed => f.pad("Failed"),
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHistoryRecord {
    /// Id of the job that produced this record
    pub id: JobId,

    /// Destination label, e.g. `CSV Download` or `Eagle.io`
    pub destination: String,

    #[serde(rename = "type")]
    pub job_type: JobType,

    pub status: HistoryStatus,

    pub records_exported: usize,

    pub timestamp: DateTime<Utc>,

    pub duration_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportHistoryRecord {
    /// Duration rendered with one decimal, e.g. `2.3s`
    pub fn duration_display(&self) -> String {
        format!("{:.1}s", self.duration_ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(duration_ms: u64) -> ExportHistoryRecord {
        ExportHistoryRecord {
            id: JobId::new("job-1").unwrap(),
            destination: "Eagle.io".to_string(),
            job_type: JobType::Scheduled,
            status: HistoryStatus::Success,
            records_exported: 1247,
            timestamp: Utc::now(),
            duration_ms,
            error: None,
        }
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(record(2300).duration_display(), "2.3s");
        assert_eq!(record(0).duration_display(), "0.0s");
        assert_eq!(record(15_040).duration_display(), "15.0s");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(record(1000)).unwrap();
        assert_eq!(json["type"], "Scheduled");
        assert_eq!(json["status"], "Success");
        assert_eq!(json["recordsExported"], 1247);
        assert!(json.get("error").is_none());
    }
}
