//! External system integrations for Lavendair.
//!
//! This module provides adapters for the systems the export pipeline talks to:
//!
//! - [`purpleair`] - PurpleAir sensor API, the raw-reading source
//! - [`eagleio`] - Eagle.io telemetry platform delivery
//! - [`aqs`] - EPA AQS Data Mart connectivity check
//! - [`store`] - Versioned key-value persistence for schedules and history
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits ([`purpleair::ReadingSource`],
//! [`eagleio::TelemetryClient`], [`store::KeyValueStore`]) so the orchestrator
//! can be tested against in-memory or mocked implementations.
//!
//! # Credentials
//!
//! No adapter keeps a process-wide key. Credentials travel with each request:
//!
//! ```rust,no_run
//! use lavendair::adapters::purpleair::{PurpleAirClient, ReadingQuery, ReadingSource};
//! use lavendair::config::{secret_string, PurpleAirConfig};
//! use lavendair::domain::SensorId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PurpleAirClient::new(&PurpleAirConfig::default())?;
//! let query = ReadingQuery {
//!     sensors: vec![SensorId::new(131075)],
//!     range: None,
//!     api_key: Some(secret_string("read-key".to_string())),
//! };
//!
//! let readings = client.fetch_readings(&query).await?;
//! println!("Fetched {} readings", readings.len());
//! # Ok(())
//! # }
//! ```

pub mod aqs;
pub mod eagleio;
pub mod purpleair;
pub mod store;
