//! Eagle.io telemetry payload encoder
//!
//! Produces `{timestamp, data: [{nodeId, name, timestamp, parameters}]}` where
//! `parameters` maps each metric label to `{value, unit, quality}`.

use super::{EncodeOptions, EncodedPayload};
use crate::domain::{ExportError, Metric, NormalizedReading, Result, SensorId};
use chrono::SecondsFormat;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Top-level telemetry document
#[derive(Debug, Serialize)]
pub struct TelemetryPayload<'a> {
    pub timestamp: String,
    pub data: Vec<TelemetryNode<'a>>,
}

/// One node record per reading
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryNode<'a> {
    pub node_id: SensorId,
    pub name: Option<&'a str>,
    pub timestamp: String,
    pub parameters: Parameters<'a>,
}

/// Metric entries, serialized in [`Metric::ALL`] order
#[derive(Debug)]
pub struct Parameters<'a>(&'a NormalizedReading);

#[derive(Debug, Serialize)]
struct ParameterValue {
    value: Option<f64>,
    unit: &'static str,
    quality: &'static str,
}

impl Serialize for Parameters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Metric::ALL.len()))?;
        for metric in Metric::ALL {
            let value = self.0.measurements.get(metric);
            map.serialize_entry(
                metric.label(),
                &ParameterValue {
                    value,
                    unit: metric.unit(),
                    quality: if value.is_some() { "good" } else { "bad" },
                },
            )?;
        }
        map.end()
    }
}

/// Build the telemetry document for a batch
pub fn build<'a>(
    readings: &'a [NormalizedReading],
    options: &EncodeOptions,
) -> TelemetryPayload<'a> {
    TelemetryPayload {
        timestamp: options
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        data: readings
            .iter()
            .map(|reading| TelemetryNode {
                node_id: reading.sensor_id,
                name: reading.name.as_deref(),
                timestamp: reading.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                parameters: Parameters(reading),
            })
            .collect(),
    }
}

/// Encode readings as an Eagle.io node data payload
pub fn encode(readings: &[NormalizedReading], options: &EncodeOptions) -> Result<EncodedPayload> {
    let body = serde_json::to_string(&build(readings, options))
        .map_err(|e| ExportError::EncodingFailed(format!("Telemetry serialization failed: {e}")))?;

    Ok(EncodedPayload {
        body,
        content_type: "application/json",
        file_name: format!(
            "eagleio_payload_{}.json",
            options.generated_at.format("%Y-%m-%d")
        ),
        record_count: readings.len(),
    })
}
