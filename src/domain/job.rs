//! Export job model and lifecycle
//!
//! An [`ExportJob`] moves `queued → processing → completed | failed` exactly once.
//! Transition methods refuse anything else, so a terminal job can never re-enter
//! processing.

use super::errors::{ExportError, LavendairError};
use super::history::JobType;
use super::ids::JobId;
use super::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flat-file format requested for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Lowercase name, also used as the file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unsupported format '{other}' (expected csv or json)")),
        }
    }
}

/// Delivery target of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Local file materialization
    Download,
    /// Eagle.io telemetry platform
    EagleIo,
    /// EPA AQS regulatory submission
    Aqs,
}

impl Destination {
    /// Canonical request-surface name
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Download => "download",
            Destination::EagleIo => "eagle_io",
            Destination::Aqs => "aqs",
        }
    }

    /// Label shown in export history
    pub fn history_label(&self, format: ExportFormat) -> &'static str {
        match (self, format) {
            (Destination::Download, ExportFormat::Csv) => "CSV Download",
            (Destination::Download, ExportFormat::Json) => "JSON Download",
            (Destination::EagleIo, _) => "Eagle.io",
            (Destination::Aqs, _) => "AQS",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = ExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "download" => Ok(Destination::Download),
            "eagle_io" | "eagleio" | "eagle.io" | "telemetry-platform" | "telemetry_platform" => {
                Ok(Destination::EagleIo)
            }
            "aqs" | "regulatory" => Ok(Destination::Aqs),
            _ => Err(ExportError::UnsupportedDestination(s.to_string())),
        }
    }
}

/// Lifecycle status of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One export request and its outcome
///
/// Format and destination are kept as the caller supplied them; they are only
/// interpreted once the job is processing, so that an unknown destination ends
/// up as a failed job rather than a rejected request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: JobId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub format: String,
    pub destination: String,
    pub job_type: JobType,
    status: JobStatus,
    pub record_count: Option<usize>,
    pub output_size: Option<usize>,
    pub output_path: Option<String>,
    /// Response body returned by a remote platform
    pub acknowledgement: Option<serde_json::Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Creates a queued job
    pub fn new(
        name: impl Into<String>,
        format: impl Into<String>,
        destination: impl Into<String>,
        job_type: JobType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::generate(),
            name: name.into(),
            created_at,
            format: format.into(),
            destination: destination.into(),
            job_type,
            status: JobStatus::Queued,
            record_count: None,
            output_size: None,
            output_path: None,
            acknowledgement: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// `queued → processing`
    pub fn mark_processing(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Queued, JobStatus::Processing)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// `processing → completed`
    pub fn mark_completed(
        &mut self,
        record_count: usize,
        output_size: usize,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.transition(JobStatus::Processing, JobStatus::Completed)?;
        self.record_count = Some(record_count);
        self.output_size = Some(output_size);
        self.completed_at = Some(at);
        Ok(())
    }

    /// `processing → failed`
    pub fn mark_failed(&mut self, error: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Processing, JobStatus::Failed)?;
        let error = error.into();
        self.error = Some(if error.trim().is_empty() {
            "Export failed".to_string()
        } else {
            error
        });
        self.completed_at = Some(at);
        Ok(())
    }

    /// Milliseconds between processing start and the terminal transition
    pub fn duration_ms(&self) -> Option<u64> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        u64::try_from((completed - started).num_milliseconds()).ok()
    }

    fn transition(&mut self, from: JobStatus, to: JobStatus) -> Result<()> {
        if self.status != from {
            return Err(LavendairError::State(format!(
                "Job {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }
}

/// Default job name, `Export YYYY-MM-DD HH:MM`
pub fn default_job_name(at: DateTime<Utc>) -> String {
    format!("Export {}", at.format("%Y-%m-%d %H:%M"))
}
