//! Format encoders
//!
//! Pure functions turning a batch of [`NormalizedReading`]s into a
//! destination-specific text payload:
//!
//! - **CSV** ([`csv`]) - fixed column order, every field quoted
//! - **JSON** ([`json`]) - the readings array, 2-space indented
//! - **Telemetry** ([`telemetry`]) - Eagle.io node data payload
//! - **AQS** ([`aqs`]) - EPA AQS XML submission
//!
//! Encoders never read the clock. Generation timestamps and submission ids are
//! derived from [`EncodeOptions::generated_at`], which makes output reproducible.

pub mod aqs;
pub mod csv;
pub mod json;
pub mod telemetry;

use crate::domain::{Destination, ExportError, ExportFormat, Metric, NormalizedReading, Result};
use chrono::{DateTime, Utc};

pub use aqs::AqsOptions;

/// Encoder selected for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Csv,
    Json,
    Telemetry,
    Aqs,
}

impl Encoding {
    /// Picks the encoder for a format/destination pair
    ///
    /// Remote destinations dictate their own wire format; the requested flat-file
    /// format only matters for downloads.
    pub fn for_job(format: ExportFormat, destination: Destination) -> Self {
        match destination {
            Destination::Download => match format {
                ExportFormat::Csv => Encoding::Csv,
                ExportFormat::Json => Encoding::Json,
            },
            Destination::EagleIo => Encoding::Telemetry,
            Destination::Aqs => Encoding::Aqs,
        }
    }
}

/// Options shared by all encoders
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// The "current time" embedded in generated payloads
    pub generated_at: DateTime<Utc>,

    /// Regulatory submission settings
    pub aqs: AqsOptions,

    /// Overrides the default file name for flat-file downloads
    pub file_name: Option<String>,
}

impl EncodeOptions {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            aqs: AqsOptions::default(),
            file_name: None,
        }
    }
}

/// Encoded batch ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    pub body: String,
    pub content_type: &'static str,
    pub file_name: String,
    pub record_count: usize,
}

impl EncodedPayload {
    /// Size of the body in bytes
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Encode a batch with the selected encoder
///
/// # Errors
///
/// Returns [`ExportError::EncodingFailed`] if a measurement or coordinate is not
/// a finite number, or serialization fails.
pub fn encode(
    readings: &[NormalizedReading],
    encoding: Encoding,
    options: &EncodeOptions,
) -> Result<EncodedPayload> {
    validate_batch(readings)?;

    let payload = match encoding {
        Encoding::Csv => csv::encode(readings, options)?,
        Encoding::Json => json::encode(readings, options)?,
        Encoding::Telemetry => telemetry::encode(readings, options)?,
        Encoding::Aqs => aqs::encode(readings, options)?,
    };

    tracing::debug!(
        encoding = ?encoding,
        records = payload.record_count,
        bytes = payload.size(),
        "Encoded reading batch"
    );

    Ok(payload)
}

/// Rejects batches that could not have come out of the normalizer
fn validate_batch(readings: &[NormalizedReading]) -> Result<()> {
    for (index, reading) in readings.iter().enumerate() {
        for metric in Metric::ALL {
            if let Some(value) = reading.measurements.get(metric) {
                if !value.is_finite() {
                    return Err(ExportError::EncodingFailed(format!(
                        "Reading {index} (sensor {}) has non-finite {metric}",
                        reading.sensor_id
                    ))
                    .into());
                }
            }
        }
        let coords = [reading.location.latitude, reading.location.longitude];
        if coords.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ExportError::EncodingFailed(format!(
                "Reading {index} (sensor {}) has non-finite coordinates",
                reading.sensor_id
            ))
            .into());
        }
    }
    Ok(())
}

/// `lavendair_export_YYYY-MM-DD.<ext>`
pub(crate) fn default_file_name(generated_at: DateTime<Utc>, extension: &str) -> String {
    format!(
        "lavendair_export_{}.{extension}",
        generated_at.format("%Y-%m-%d")
    )
}
