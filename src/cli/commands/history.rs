//! History command implementation
//!
//! Prints the export history ledger, most recent first, followed by totals.

use crate::adapters::store::create_store;
use crate::config::load_config_or_default;
use crate::core::state::{ExportHistoryLedger, HistorySummary};
use crate::domain::ExportHistoryRecord;
use clap::Args;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of records to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Print records as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl HistoryArgs {
    /// Execute the history command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let ledger = match create_store(&config.storage).await {
            Ok(store) => ExportHistoryLedger::new(store, config.storage.max_write_attempts),
            Err(e) => {
                eprintln!("Failed to open storage: {e}");
                return Ok(5);
            }
        };

        let records = ledger.list().await?;
        let shown: Vec<&ExportHistoryRecord> = records.iter().take(self.limit).collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&shown)?);
            return Ok(0);
        }

        if shown.is_empty() {
            println!("No exports recorded yet");
            return Ok(0);
        }

        println!("{}", header());
        for record in &shown {
            println!("{}", row(record));
        }
        println!();
        print_summary(&ledger.summary().await?);
        Ok(0)
    }
}

fn header() -> String {
    format!(
        "{:<20}  {:<14}  {:<9}  {:<7}  {:>8}  {:>8}  ERROR",
        "TIMESTAMP", "DESTINATION", "TYPE", "STATUS", "RECORDS", "DURATION"
    )
}

fn row(record: &ExportHistoryRecord) -> String {
    format!(
        "{:<20}  {:<14}  {:<9}  {:<7}  {:>8}  {:>8}  {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.destination,
        record.job_type,
        record.status,
        record.records_exported,
        record.duration_display(),
        record.error.as_deref().unwrap_or("")
    )
}

fn print_summary(summary: &HistorySummary) {
    println!("📊 Summary:");
    println!("  Total Exports: {}", summary.total);
    println!("  Successful: {}", summary.successful);
    println!("  Failed: {}", summary.failed);
    println!("  Records Exported: {}", summary.records_exported);
    println!("  Success Rate: {:.1}%", summary.success_rate());
}
