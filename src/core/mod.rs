//! Core business logic for Lavendair.
//!
//! This module contains the reading pipeline and the bookkeeping around it.
//!
//! # Modules
//!
//! - [`normalize`] - Calibration and range checks for raw readings
//! - [`encode`] - CSV, JSON, Eagle.io and AQS encoders
//! - [`export`] - Export orchestration and job lifecycle
//! - [`state`] - Schedule registry and export history ledger
//!
//! # Export Workflow
//!
//! 1. **Queue**: A request becomes an [`ExportJob`](crate::domain::ExportJob) in `queued`
//! 2. **Fetch**: Raw readings are pulled from the sensor API
//! 3. **Normalize**: Each reading is calibrated and range-checked
//! 4. **Encode**: The batch is serialized for its destination
//! 5. **Deliver**: A file is written or the payload is posted to Eagle.io
//! 6. **Record**: One history record is appended for the finished job
//!
//! # Example
//!
//! ```rust,no_run
//! use lavendair::config::load_config_or_default;
//! use lavendair::core::export::{ExportCredentials, ExportOrchestrator, ExportRequest};
//! use lavendair::domain::SensorId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_default("lavendair.toml")?;
//! let orchestrator = ExportOrchestrator::from_config(&config).await?;
//!
//! let request = ExportRequest::new([SensorId::new(131075)], "csv", "download")
//!     .with_credentials(ExportCredentials::from_config(&config));
//! let job = orchestrator.execute(request).await;
//!
//! println!("{} {}", job.id, job.status());
//! # Ok(())
//! # }
//! ```

pub mod encode;
pub mod export;
pub mod normalize;
pub mod state;
