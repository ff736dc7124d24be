//! Export requests
//!
//! An [`ExportRequest`] is the job-request surface: date range, sensor selection,
//! format, destination, and the credentials to use for this run. Format and
//! destination stay strings until the job is processing, so a bad value becomes a
//! failed job instead of a rejected call.

use crate::config::{secret_from_env, LavendairConfig, SecretString};
use crate::domain::{CredentialsRef, JobType, ScheduleDefinition, SensorId, TimeRange};

/// One selected sensor with an optional calibration factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSelection {
    pub sensor_id: SensorId,

    /// Overrides the configured factor for this sensor
    pub calibration_factor: Option<f64>,
}

impl From<SensorId> for SensorSelection {
    fn from(sensor_id: SensorId) -> Self {
        Self {
            sensor_id,
            calibration_factor: None,
        }
    }
}

/// Credentials scoped to a single export
#[derive(Debug, Clone, Default)]
pub struct ExportCredentials {
    pub purpleair_api_key: Option<SecretString>,

    /// Overrides the configured Eagle.io API URL
    pub eagleio_api_url: Option<String>,

    pub eagleio_api_key: Option<SecretString>,
}

impl ExportCredentials {
    /// Keys from the loaded configuration
    pub fn from_config(config: &LavendairConfig) -> Self {
        Self {
            purpleair_api_key: config.purpleair.api_key.clone(),
            eagleio_api_url: None,
            eagleio_api_key: config.eagleio.api_key.clone(),
        }
    }

    /// Keys from configuration, overridden by a schedule's credential references
    ///
    /// Referenced environment variables that are unset leave the configured
    /// value in place.
    pub fn resolve(reference: &CredentialsRef, config: &LavendairConfig) -> Self {
        let mut credentials = Self::from_config(config);
        if let Some(endpoint) = reference.endpoint.as_ref().filter(|e| !e.trim().is_empty()) {
            credentials.eagleio_api_url = Some(endpoint.clone());
        }
        if let Some(key) = reference.api_key_env.as_deref().and_then(secret_from_env) {
            credentials.eagleio_api_key = Some(key);
        }
        credentials
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Job name; defaults to `Export YYYY-MM-DD HH:MM`
    pub name: Option<String>,

    /// `None` exports each sensor's current reading
    pub range: Option<TimeRange>,

    pub sensors: Vec<SensorSelection>,

    /// `csv` or `json`
    pub format: String,

    /// `download`, `eagle_io` or `aqs` (and their aliases)
    pub destination: String,

    pub job_type: JobType,

    /// Overrides the generated file name for downloads
    pub file_name: Option<String>,

    /// Overrides the configured AQS site number
    pub site_number: Option<String>,

    pub credentials: ExportCredentials,
}

impl ExportRequest {
    /// A manual export of the current readings
    pub fn new(
        sensors: impl IntoIterator<Item = SensorId>,
        format: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            range: None,
            sensors: sensors.into_iter().map(SensorSelection::from).collect(),
            format: format.into(),
            destination: destination.into(),
            job_type: JobType::Manual,
            file_name: None,
            site_number: None,
            credentials: ExportCredentials::default(),
        }
    }

    /// A scheduled export built from a stored definition
    pub fn from_schedule(
        schedule: &ScheduleDefinition,
        range: Option<TimeRange>,
        config: &LavendairConfig,
    ) -> Self {
        Self {
            name: Some(schedule.name.clone()),
            range,
            sensors: schedule
                .sensors
                .iter()
                .copied()
                .map(SensorSelection::from)
                .collect(),
            format: schedule.format.as_str().to_string(),
            destination: schedule.destination.as_str().to_string(),
            job_type: JobType::Scheduled,
            file_name: None,
            site_number: schedule.credentials.facility_id.clone(),
            credentials: ExportCredentials::resolve(&schedule.credentials, config),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_credentials(mut self, credentials: ExportCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Applies one calibration factor to every selected sensor
    pub fn with_calibration(mut self, factor: f64) -> Self {
        for selection in &mut self.sensors {
            selection.calibration_factor = Some(factor);
        }
        self
    }

    pub fn sensor_ids(&self) -> Vec<SensorId> {
        self.sensors.iter().map(|s| s.sensor_id).collect()
    }

    /// Factor requested for a sensor, if any
    pub fn calibration_for(&self, sensor: SensorId) -> Option<f64> {
        self.sensors
            .iter()
            .find(|s| s.sensor_id == sensor)
            .and_then(|s| s.calibration_factor)
    }
}
