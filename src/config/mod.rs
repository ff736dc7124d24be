//! Configuration management for Lavendair.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Lavendair uses an optional TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `LAVENDAIR_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation with human-readable messages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lavendair::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lavendair.toml")?;
//!
//! println!("PurpleAir: {}", config.purpleair.base_url);
//! println!("Output dir: {}", config.export.output_dir);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`PurpleAirConfig`] - Sensor API URL, key and timeouts
//! - [`EagleIoConfig`] - Telemetry platform URL, key and timeout
//! - [`AqsConfig`] - Site codes, submitter and AQS API account
//! - [`ExportConfig`] - Output directory and calibration factors
//! - [`StorageConfig`] - Schedule/history persistence
//! - [`LoggingConfig`] - Rolling JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [purpleair]
//! api_key = "${PURPLEAIR_API_KEY}"
//!
//! [eagleio]
//! api_key = "${EAGLEIO_API_KEY}"
//!
//! [aqs]
//! state_code = "06"
//! county_code = "075"
//! site_number = "0005"
//!
//! [export]
//! output_dir = "./exports"
//! calibration_factor = 1.0
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, AqsConfig, EagleIoConfig, ExportConfig, LavendairConfig, LoggingConfig,
    PurpleAirConfig, StorageBackend, StorageConfig,
};
pub use secret::{secret_from_env, secret_string, SecretString, SecretValue};
