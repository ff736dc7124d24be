//! Configuration schema types
//!
//! Every section and every key has a default, so an empty file (or no file at
//! all) yields a usable [`LavendairConfig`].

use crate::config::SecretString;
use crate::core::encode::AqsOptions;
use crate::domain::SensorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Persistence backend for schedules and export history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files in a directory
    #[default]
    File,
    /// Process memory (lost on exit)
    Memory,
}

/// Main Lavendair configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LavendairConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    /// PurpleAir sensor API
    #[serde(default)]
    pub purpleair: PurpleAirConfig,

    /// Eagle.io telemetry platform
    #[serde(default)]
    pub eagleio: EagleIoConfig,

    /// EPA AQS submission settings
    #[serde(default)]
    pub aqs: AqsConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LavendairConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.purpleair.validate()?;
        self.eagleio.validate()?;
        self.aqs.validate()?;
        self.export.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// PurpleAir API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurpleAirConfig {
    #[serde(default = "default_purpleair_url")]
    pub base_url: String,

    /// Read key sent as `X-API-Key`
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_source_timeout_seconds")]
    pub timeout_seconds: u64,

    /// History averaging period in minutes
    #[serde(default = "default_average_minutes")]
    pub average_minutes: u32,
}

impl Default for PurpleAirConfig {
    fn default() -> Self {
        Self {
            base_url: default_purpleair_url(),
            api_key: None,
            timeout_seconds: default_source_timeout_seconds(),
            average_minutes: default_average_minutes(),
        }
    }
}

impl PurpleAirConfig {
    fn validate(&self) -> Result<(), String> {
        validate_url("purpleair.base_url", &self.base_url)?;

        if self.timeout_seconds == 0 {
            return Err("purpleair.timeout_seconds must be > 0".to_string());
        }

        let valid_averages = [0, 10, 30, 60, 360, 1440, 10080, 43200, 525600];
        if !valid_averages.contains(&self.average_minutes) {
            return Err(format!(
                "Invalid purpleair.average_minutes {}. Must be one of: {:?}",
                self.average_minutes, valid_averages
            ));
        }
        Ok(())
    }
}

/// Eagle.io configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EagleIoConfig {
    /// API base URL; `/v1/nodes/data` is appended for uploads
    #[serde(default = "default_eagleio_url")]
    pub api_url: String,

    /// Bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_delivery_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for EagleIoConfig {
    fn default() -> Self {
        Self {
            api_url: default_eagleio_url(),
            api_key: None,
            timeout_seconds: default_delivery_timeout_seconds(),
        }
    }
}

impl EagleIoConfig {
    fn validate(&self) -> Result<(), String> {
        validate_url("eagleio.api_url", &self.api_url)?;
        if self.timeout_seconds == 0 {
            return Err("eagleio.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// EPA AQS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AqsConfig {
    #[serde(default = "default_state_code")]
    pub state_code: String,

    #[serde(default = "default_county_code")]
    pub county_code: String,

    #[serde(default = "default_site_number")]
    pub site_number: String,

    #[serde(default = "default_submitter_name")]
    pub submitter_name: String,

    #[serde(default = "default_submitter_email")]
    pub submitter_email: String,

    #[serde(default = "default_organization_name")]
    pub organization_name: String,

    /// AQS data API, used for connectivity checks
    #[serde(default = "default_aqs_url")]
    pub api_url: String,

    /// Registered AQS API account email
    #[serde(default)]
    pub email: Option<String>,

    /// AQS API key
    #[serde(default)]
    pub key: Option<SecretString>,
}

impl Default for AqsConfig {
    fn default() -> Self {
        Self {
            state_code: default_state_code(),
            county_code: default_county_code(),
            site_number: default_site_number(),
            submitter_name: default_submitter_name(),
            submitter_email: default_submitter_email(),
            organization_name: default_organization_name(),
            api_url: default_aqs_url(),
            email: None,
            key: None,
        }
    }
}

impl AqsConfig {
    fn validate(&self) -> Result<(), String> {
        validate_digits("aqs.state_code", &self.state_code, 2)?;
        validate_digits("aqs.county_code", &self.county_code, 3)?;
        validate_digits("aqs.site_number", &self.site_number, 4)?;

        if !self.submitter_email.contains('@') {
            return Err(format!(
                "aqs.submitter_email '{}' is not an email address",
                self.submitter_email
            ));
        }
        validate_url("aqs.api_url", &self.api_url)?;
        Ok(())
    }

    /// Site and submitter details for the XML encoder
    pub fn to_options(&self) -> AqsOptions {
        AqsOptions {
            state_code: self.state_code.clone(),
            county_code: self.county_code.clone(),
            site_number: self.site_number.clone(),
            submitter_name: self.submitter_name.clone(),
            submitter_email: self.submitter_email.clone(),
            organization_name: self.organization_name.clone(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory that download and AQS files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Calibration factor applied when a sensor has no override
    #[serde(default = "default_calibration_factor")]
    pub calibration_factor: f64,

    /// Per-sensor calibration factors keyed by sensor index
    #[serde(default)]
    pub calibration_overrides: BTreeMap<String, f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            calibration_factor: default_calibration_factor(),
            calibration_overrides: BTreeMap::new(),
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }
        validate_factor("export.calibration_factor", self.calibration_factor)?;

        for (sensor, factor) in &self.calibration_overrides {
            SensorId::from_str(sensor)
                .map_err(|e| format!("export.calibration_overrides: {e}"))?;
            validate_factor(&format!("export.calibration_overrides.{sensor}"), *factor)?;
        }
        Ok(())
    }

    /// Calibration factor for a sensor
    pub fn calibration_for(&self, sensor: SensorId) -> f64 {
        self.calibration_overrides
            .get(&sensor.to_string())
            .copied()
            .unwrap_or(self.calibration_factor)
    }
}

/// Schedule and history persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Optimistic write attempts before reporting a conflict
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StorageBackend::File && self.path.trim().is_empty() {
            return Err("storage.path cannot be empty for the file backend".to_string());
        }
        if self.max_write_attempts == 0 || self.max_write_attempts > 100 {
            return Err(format!(
                "storage.max_write_attempts must be between 1 and 100, got {}",
                self.max_write_attempts
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rolling files
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }
        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("{field} must start with http:// or https://"));
    }
    Ok(())
}

fn validate_digits(field: &str, value: &str, len: usize) -> Result<(), String> {
    if value.len() != len || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "{field} must be exactly {len} digits, got '{value}'"
        ));
    }
    Ok(())
}

fn validate_factor(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{field} must be a positive number, got {value}"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_purpleair_url() -> String {
    "https://api.purpleair.com/v1".to_string()
}

fn default_source_timeout_seconds() -> u64 {
    10
}

fn default_average_minutes() -> u32 {
    60
}

fn default_eagleio_url() -> String {
    "https://api.eagle.io/api".to_string()
}

fn default_delivery_timeout_seconds() -> u64 {
    30
}

fn default_state_code() -> String {
    "06".to_string()
}

fn default_county_code() -> String {
    "001".to_string()
}

fn default_site_number() -> String {
    "0001".to_string()
}

fn default_submitter_name() -> String {
    "Lavendair User".to_string()
}

fn default_submitter_email() -> String {
    "user@example.com".to_string()
}

fn default_organization_name() -> String {
    "Lavendair".to_string()
}

fn default_aqs_url() -> String {
    "https://aqs.epa.gov/data/api".to_string()
}

fn default_output_dir() -> String {
    "./exports".to_string()
}

fn default_calibration_factor() -> f64 {
    1.0
}

fn default_storage_path() -> String {
    "./.lavendair".to_string()
}

fn default_max_write_attempts() -> usize {
    crate::adapters::store::collection::DEFAULT_MAX_ATTEMPTS
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LavendairConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.eagleio.timeout_seconds, 30);
        assert_eq!(config.purpleair.base_url, "https://api.purpleair.com/v1");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: LavendairConfig = toml::from_str("").unwrap();
        assert_eq!(config.aqs.state_code, "06");
        assert_eq!(config.aqs.county_code, "001");
        assert_eq!(config.aqs.site_number, "0001");
        assert_eq!(config.aqs.submitter_name, "Lavendair User");
        assert_eq!(config.export.calibration_factor, 1.0);
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_validation() {
        let mut config = EagleIoConfig::default();
        config.api_url = "ftp://eagle.io".to_string();
        assert!(config.validate().is_err());

        config.api_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aqs_code_validation() {
        let mut config = AqsConfig::default();
        config.state_code = "6".to_string();
        assert!(config.validate().is_err());

        config.state_code = "41".to_string();
        config.county_code = "05A".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aqs_options_from_config() {
        let mut config = AqsConfig::default();
        config.organization_name = "Bay Area AQMD".to_string();
        let options = config.to_options();
        assert_eq!(options.organization_name, "Bay Area AQMD");
        assert_eq!(options.state_code, "06");
    }

    #[test]
    fn test_average_minutes_validation() {
        let mut config = PurpleAirConfig::default();
        config.average_minutes = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_calibration_overrides() {
        let config: LavendairConfig = toml::from_str(
            r#"
[export]
calibration_factor = 0.9

[export.calibration_overrides]
"131075" = 1.05
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.export.calibration_for(SensorId::new(131075)), 1.05);
        assert_eq!(config.export.calibration_for(SensorId::new(1)), 0.9);
    }

    #[test]
    fn test_invalid_calibration() {
        let mut config = ExportConfig::default();
        config.calibration_factor = 0.0;
        assert!(config.validate().is_err());

        config.calibration_factor = 1.0;
        config.calibration_overrides.insert("abc".to_string(), 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_validation() {
        let mut config = StorageConfig::default();
        config.max_write_attempts = 0;
        assert!(config.validate().is_err());

        config.max_write_attempts = 5;
        config.backend = StorageBackend::Memory;
        config.path = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }
}
