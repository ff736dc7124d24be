//! Persisted bookkeeping: schedules and export history

pub mod ledger;
pub mod registry;

pub use ledger::{ExportHistoryLedger, HistorySummary};
pub use registry::ScheduleRegistry;
