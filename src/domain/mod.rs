//! Domain models and types for Lavendair.
//!
//! This module contains the core domain models and business rules: sensor
//! readings before and after normalization, export jobs with their lifecycle,
//! recurring schedules and the history records written for every finished job.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SensorId`], [`JobId`], [`ScheduleId`])
//! - **Readings** ([`RawReading`], [`NormalizedReading`], [`Metric`])
//! - **Jobs** ([`ExportJob`], [`JobStatus`], [`Destination`], [`ExportFormat`])
//! - **Bookkeeping** ([`ScheduleDefinition`], [`ExportHistoryRecord`])
//! - **Error types** ([`LavendairError`], [`ExportError`], [`SourceError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Job lifecycle
//!
//! ```rust
//! use lavendair::domain::{ExportJob, JobStatus, JobType};
//! use chrono::Utc;
//!
//! # fn example() -> lavendair::domain::Result<()> {
//! let mut job = ExportJob::new("Export", "csv", "download", JobType::Manual, Utc::now());
//! job.mark_processing(Utc::now())?;
//! job.mark_completed(10, 2048, Utc::now())?;
//!
//! assert_eq!(job.status(), JobStatus::Completed);
//! // Terminal states are final
//! assert!(job.mark_processing(Utc::now()).is_err());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod history;
pub mod ids;
pub mod job;
pub mod reading;
pub mod result;
pub mod schedule;

// Re-export commonly used types for convenience
pub use errors::{ExportError, LavendairError, SourceError, StoreError};
pub use history::{ExportHistoryRecord, HistoryStatus, JobType};
pub use ids::{JobId, ScheduleId, SensorId};
pub use job::{default_job_name, Destination, ExportFormat, ExportJob, JobStatus};
pub use reading::{
    Location, Measurements, Metric, NormalizedReading, RawReading, SensorPayload, TimeRange,
};
pub use result::Result;
pub use schedule::{CredentialsRef, Frequency, ScheduleDefinition, ScheduleStatus};
