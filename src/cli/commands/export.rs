//! Export command implementation
//!
//! This module implements the `export` command, which runs one manual export
//! job to completion and prints its outcome.

use crate::config::{load_config_or_default, LavendairConfig};
use crate::core::export::{ExportCredentials, ExportOrchestrator, ExportRequest};
use crate::domain::{ExportJob, JobStatus, SensorId, TimeRange};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Sensor indexes to export (comma-separated)
    #[arg(short, long)]
    pub sensors: String,

    /// First day to export (YYYY-MM-DD); omit with --end for current readings
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day to export, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Output format (csv or json)
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Destination (download, eagle_io or aqs)
    #[arg(short, long, default_value = "download")]
    pub destination: String,

    /// Override the configured output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Calibration factor applied to every selected sensor
    #[arg(long, allow_negative_numbers = true)]
    pub calibration: Option<f64>,

    /// Job name
    #[arg(long)]
    pub name: Option<String>,

    /// Override the generated file name for downloads
    #[arg(long)]
    pub file_name: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir, "Overriding output directory from CLI");
            config.export.output_dir = dir.clone();
        }

        let request = match self.build_request(&config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Invalid export request: {e}");
                return Ok(2);
            }
        };

        let orchestrator = match ExportOrchestrator::from_config(&config).await {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export orchestrator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4);
            }
        };

        println!("🚀 Starting export...");
        println!();

        let ticket = orchestrator.run_export(request);
        println!("  Job: {} ({})", ticket.job.name, ticket.job.id);
        let job = ticket.wait().await?;

        print_job(&job);

        Ok(match job.status() {
            JobStatus::Completed => 0,
            _ => 1,
        })
    }

    fn build_request(&self, config: &LavendairConfig) -> Result<ExportRequest, String> {
        let sensors = SensorId::parse_list(&self.sensors)?;
        if sensors.is_empty() {
            return Err("at least one sensor is required".to_string());
        }

        let mut request = ExportRequest::new(sensors, &self.format, &self.destination)
            .with_credentials(ExportCredentials::from_config(config));

        if let (Some(start), Some(end)) = (self.start, self.end) {
            request = request.with_range(TimeRange::from_dates(start, end)?);
        }
        if let Some(factor) = self.calibration {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!("calibration must be a positive number, got {factor}"));
            }
            request = request.with_calibration(factor);
        }
        if let Some(name) = &self.name {
            request = request.with_name(name);
        }
        if let Some(file_name) = &self.file_name {
            request = request.with_file_name(file_name);
        }

        Ok(request)
    }
}

fn print_job(job: &ExportJob) {
    println!();
    println!("📊 Export Summary:");
    println!("  Status: {}", job.status());
    println!("  Destination: {}", job.destination);
    println!("  Format: {}", job.format);
    if let Some(records) = job.record_count {
        println!("  Records: {records}");
    }
    if let Some(size) = job.output_size {
        println!("  Output Size: {size} bytes");
    }
    if let Some(path) = &job.output_path {
        println!("  File: {path}");
    }
    if let Some(ms) = job.duration_ms() {
        println!("  Duration: {:.2}s", ms as f64 / 1000.0);
    }
    println!();

    match &job.error {
        Some(error) => println!("❌ Export failed: {error}"),
        None => println!("✅ Export completed successfully!"),
    }
}
