//! Export orchestration
//!
//! - [`request`] - the job-request surface and per-request credentials
//! - [`orchestrator`] - [`ExportOrchestrator`], which runs jobs to a terminal state

pub mod orchestrator;
pub mod request;

pub use orchestrator::{ExportOrchestrator, ExportTicket, OrchestratorSettings};
pub use request::{ExportCredentials, ExportRequest, SensorSelection};
