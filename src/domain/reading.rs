//! Sensor reading models
//!
//! [`RawReading`] mirrors the PurpleAir single-sensor response envelope.
//! [`NormalizedReading`] is the calibrated, range-checked form every encoder consumes.

use super::ids::SensorId;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Particulate and environmental metrics reported by a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Pm1_0,
    Pm2_5,
    Pm10_0,
    Humidity,
    Temperature,
    Pressure,
}

impl Metric {
    /// All metrics in output column order
    pub const ALL: [Metric; 6] = [
        Metric::Pm1_0,
        Metric::Pm2_5,
        Metric::Pm10_0,
        Metric::Humidity,
        Metric::Temperature,
        Metric::Pressure,
    ];

    /// Key used in the `measurements` map
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Pm1_0 => "pm1_0",
            Metric::Pm2_5 => "pm2_5",
            Metric::Pm10_0 => "pm10_0",
            Metric::Humidity => "humidity",
            Metric::Temperature => "temperature",
            Metric::Pressure => "pressure",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pm1_0 => "PM1.0",
            Metric::Pm2_5 => "PM2.5",
            Metric::Pm10_0 => "PM10",
            Metric::Humidity => "Humidity",
            Metric::Temperature => "Temperature",
            Metric::Pressure => "Pressure",
        }
    }

    /// Measurement unit
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Pm1_0 | Metric::Pm2_5 | Metric::Pm10_0 => "μg/m³",
            Metric::Humidity => "%",
            Metric::Temperature => "°C",
            Metric::Pressure => "hPa",
        }
    }

    /// Inclusive physically valid range
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            Metric::Pm1_0 | Metric::Pm2_5 | Metric::Pm10_0 => (0.0, 1000.0),
            Metric::Humidity => (0.0, 100.0),
            Metric::Temperature => (-50.0, 70.0),
            Metric::Pressure => (800.0, 1200.0),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sensor payload as reported by the sensor API
///
/// Metric fields accept numbers or numeric strings; anything else
/// deserializes to `None` and is later treated as a missing measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    #[serde(default)]
    pub sensor_index: Option<SensorId>,

    #[serde(default)]
    pub name: Option<String>,

    /// Unix epoch seconds
    #[serde(default)]
    pub last_seen: Option<i64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,

    #[serde(
        rename = "pm1.0_atm",
        alias = "pm1_0_atm",
        default,
        deserialize_with = "lenient_number"
    )]
    pub pm1_0_atm: Option<f64>,

    #[serde(
        rename = "pm2.5_atm",
        alias = "pm2_5_atm",
        default,
        deserialize_with = "lenient_number"
    )]
    pub pm2_5_atm: Option<f64>,

    #[serde(
        rename = "pm10.0_atm",
        alias = "pm10_0_atm",
        default,
        deserialize_with = "lenient_number"
    )]
    pub pm10_0_atm: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub humidity: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub temperature: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub pressure: Option<f64>,
}

impl SensorPayload {
    /// Raw value reported for a metric
    pub fn raw_value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pm1_0 => self.pm1_0_atm,
            Metric::Pm2_5 => self.pm2_5_atm,
            Metric::Pm10_0 => self.pm10_0_atm,
            Metric::Humidity => self.humidity,
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
        }
    }
}

/// Raw sensor reading envelope
///
/// Immutable once received; the normalizer only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub api_version: Option<String>,

    /// Time the API produced the response (epoch seconds)
    #[serde(default)]
    pub time_stamp: Option<i64>,

    #[serde(default)]
    pub sensor: Option<SensorPayload>,
}

impl RawReading {
    /// Wraps a sensor payload in an envelope
    pub fn from_sensor(sensor: SensorPayload) -> Self {
        Self {
            api_version: None,
            time_stamp: None,
            sensor: Some(sensor),
        }
    }
}

/// Geographic position of a sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Calibrated measurements, one slot per [`Metric`]
///
/// Every value is `None` or a finite number inside the metric's valid range,
/// rounded to one decimal place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub pm1_0: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10_0: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
}

impl Measurements {
    /// Value for a metric
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pm1_0 => self.pm1_0,
            Metric::Pm2_5 => self.pm2_5,
            Metric::Pm10_0 => self.pm10_0,
            Metric::Humidity => self.humidity,
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
        }
    }

    /// Sets the value for a metric
    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Pm1_0 => &mut self.pm1_0,
            Metric::Pm2_5 => &mut self.pm2_5,
            Metric::Pm10_0 => &mut self.pm10_0,
            Metric::Humidity => &mut self.humidity,
            Metric::Temperature => &mut self.temperature,
            Metric::Pressure => &mut self.pressure,
        };
        *slot = value;
    }
}

/// Calibrated, range-validated sensor sample ready for encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    pub sensor_id: SensorId,
    pub name: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub location: Location,
    pub measurements: Measurements,
    /// When normalization ran (distinct from `last_seen`)
    pub timestamp: DateTime<Utc>,
}

/// Half-open time window `[start, end)` for historical readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range, rejecting an end before the start
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if end < start {
            return Err(format!("End {end} is before start {start}"));
        }
        Ok(Self { start, end })
    }

    /// Whole days from `start` through `end` inclusive, in UTC
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        let end = end
            .succ_opt()
            .ok_or_else(|| format!("Date out of range: {end}"))?;
        Self::new(
            start.and_time(NaiveTime::MIN).and_utc(),
            end.and_time(NaiveTime::MIN).and_utc(),
        )
    }
}

/// Accepts JSON numbers and numeric strings; everything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|v| v.is_finite()))
}
