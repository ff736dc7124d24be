//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Lavendair using clap.
//!
//! Exit codes: `0` success, `1` export job failed, `2` configuration or input
//! error, `4` connection error, `5` fatal error.

pub mod commands;

use clap::{Parser, Subcommand};

/// Lavendair - particulate sensor export pipeline
#[derive(Parser, Debug)]
#[command(name = "lavendair")]
#[command(version, about, long_about = None)]
#[command(author = "Lavendair Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lavendair.toml", env = "LAVENDAIR_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LAVENDAIR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export sensor readings to a file, Eagle.io or an AQS submission
    Export(commands::export::ExportArgs),

    /// Manage recurring export definitions
    Schedule(commands::schedule::ScheduleArgs),

    /// Show export history
    History(commands::history::HistoryArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Check credentials against PurpleAir, Eagle.io or AQS
    TestConnection(commands::test_connection::TestConnectionArgs),
}
