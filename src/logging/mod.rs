//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with an `EnvFilter`
//! - JSON-formatted log files with daily or hourly rotation
//! - Job lifecycle macros with consistent field names
//!
//! # Example
//!
//! ```no_run
//! use lavendair::logging::init_logging;
//! use lavendair::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(sensors = 3, "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export job
///
/// # Example
///
/// ```no_run
/// use lavendair::log_export_start;
/// use lavendair::domain::JobId;
///
/// let job_id = JobId::generate();
/// log_export_start!(job_id, "download", "csv");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($job_id:expr, $destination:expr, $format:expr) => {
        tracing::info!(
            job_id = %$job_id,
            destination = %$destination,
            format = %$format,
            "Starting export"
        )
    };
}

/// Log a completed export job
///
/// # Example
///
/// ```no_run
/// use lavendair::log_export_complete;
/// use lavendair::domain::JobId;
///
/// log_export_complete!(JobId::generate(), 42, 1250u64);
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($job_id:expr, $records:expr, $duration_ms:expr) => {
        tracing::info!(
            job_id = %$job_id,
            records = $records,
            duration_ms = $duration_ms,
            "Export completed"
        )
    };
}

/// Log a failed export job
#[macro_export]
macro_rules! log_export_failed {
    ($job_id:expr, $error:expr) => {
        tracing::error!(
            job_id = %$job_id,
            error = %$error,
            "Export failed"
        )
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use lavendair::log_error_with_context;
/// use lavendair::domain::LavendairError;
///
/// let error = LavendairError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        )
    };
}
