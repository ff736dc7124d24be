// Lavendair - PurpleAir sensor export pipeline
// Copyright (c) 2025 Lavendair Contributors
// Licensed under the MIT License

//! # Lavendair - PurpleAir sensor export pipeline
//!
//! Lavendair turns raw PurpleAir particulate sensor readings into validated,
//! calibrated records and ships them as CSV or JSON files, Eagle.io telemetry
//! payloads or EPA AQS XML submissions.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** current and historical readings from the PurpleAir API
//! - **Normalizing** them: range checks and calibration
//! - **Encoding** CSV, JSON, Eagle.io telemetry and AQS XML documents
//! - **Running** export jobs through `queued → processing → completed | failed`
//! - **Recording** every finished job in an append-only history ledger
//! - **Storing** recurring export definitions
//!
//! ## Architecture
//!
//! Lavendair follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (normalize, encode, export, state)
//! - [`adapters`] - External integrations (PurpleAir, Eagle.io, AQS, storage)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lavendair::config::load_config_or_default;
//! use lavendair::core::export::{ExportOrchestrator, ExportRequest, ExportCredentials};
//! use lavendair::domain::SensorId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_or_default("lavendair.toml")?;
//!     let orchestrator = ExportOrchestrator::from_config(&config).await?;
//!
//!     let request = ExportRequest::new([SensorId::new(131075)], "csv", "download")
//!         .with_credentials(ExportCredentials::from_config(&config));
//!     let job = orchestrator.execute(request).await;
//!
//!     println!("{}: {:?} records", job.status(), job.record_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], an alias over [`domain::LavendairError`].
//! Export failures never escape as errors: they end the job in `failed` with a
//! readable message and a history record.
//!
//! ## Logging
//!
//! Lavendair logs through `tracing`; see [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
