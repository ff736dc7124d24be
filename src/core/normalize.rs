//! Reading normalization
//!
//! Converts one raw sensor payload into a calibrated [`NormalizedReading`].
//! Out-of-range and non-numeric values become `None`; they are a data-quality
//! signal, not an error. Only a structurally malformed reading fails.

use crate::domain::{
    LavendairError, Location, Measurements, Metric, NormalizedReading, RawReading, Result,
};
use chrono::{DateTime, TimeZone, Utc};

/// Normalize a single raw reading
///
/// Each metric is multiplied by `calibration_factor`, checked against the
/// metric's inclusive valid range and rounded to one decimal place
/// (half away from zero).
///
/// # Arguments
///
/// * `raw` - Raw reading as received from the sensor API
/// * `calibration_factor` - Multiplier correcting sensor-specific bias
/// * `captured_at` - Capture timestamp stored on the result
///
/// # Errors
///
/// Returns [`LavendairError::InvalidInput`] if the reading has no sensor payload,
/// no sensor index, or the calibration factor is not finite.
///
/// # Examples
///
/// ```
/// use lavendair::core::normalize::normalize;
/// use lavendair::domain::{RawReading, SensorPayload, SensorId};
/// use chrono::Utc;
///
/// let raw = RawReading::from_sensor(SensorPayload {
///     sensor_index: Some(SensorId::new(1)),
///     pm2_5_atm: Some(10.04),
///     ..Default::default()
/// });
///
/// let reading = normalize(&raw, 1.05, Utc::now()).unwrap();
/// assert_eq!(reading.measurements.pm2_5, Some(10.5));
/// ```
pub fn normalize(
    raw: &RawReading,
    calibration_factor: f64,
    captured_at: DateTime<Utc>,
) -> Result<NormalizedReading> {
    if !calibration_factor.is_finite() {
        return Err(LavendairError::InvalidInput(format!(
            "Calibration factor must be a finite number, got {calibration_factor}"
        )));
    }

    let sensor = raw.sensor.as_ref().ok_or_else(|| {
        LavendairError::InvalidInput("Reading has no sensor payload".to_string())
    })?;

    let sensor_id = sensor.sensor_index.ok_or_else(|| {
        LavendairError::InvalidInput("Sensor payload has no sensor_index".to_string())
    })?;

    let mut measurements = Measurements::default();
    for metric in Metric::ALL {
        let value = sensor
            .raw_value(metric)
            .and_then(|v| calibrate(metric, v, calibration_factor));
        measurements.set(metric, value);
    }

    Ok(NormalizedReading {
        sensor_id,
        name: sensor.name.clone(),
        last_seen: sensor
            .last_seen
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        location: Location {
            latitude: sensor.latitude,
            longitude: sensor.longitude,
        },
        measurements,
        timestamp: captured_at,
    })
}

fn calibrate(metric: Metric, raw: f64, factor: f64) -> Option<f64> {
    let value = raw * factor;
    if !value.is_finite() {
        return None;
    }
    let (min, max) = metric.valid_range();
    if value < min || value > max {
        return None;
    }
    Some(round_one_decimal(value))
}

/// Round to one decimal place, half away from zero
pub fn round_one_decimal(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid emitting -0.0 for tiny negative temperatures
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
