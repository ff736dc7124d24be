//! CSV encoder

use super::{default_file_name, EncodeOptions, EncodedPayload};
use crate::domain::{ExportError, Metric, NormalizedReading, Result};
use ::csv::{QuoteStyle, Terminator, WriterBuilder};
use chrono::SecondsFormat;

/// Header row, in column order
pub fn headers() -> Vec<String> {
    let mut headers = vec![
        "Sensor ID".to_string(),
        "Name".to_string(),
        "Timestamp".to_string(),
    ];
    headers.extend(
        Metric::ALL
            .iter()
            .map(|m| format!("{} ({})", m.label(), m.unit())),
    );
    headers.push("Latitude".to_string());
    headers.push("Longitude".to_string());
    headers
}

/// Encode readings as CSV
///
/// Every field is double-quoted, missing values are empty strings, rows are
/// separated by `\n` with no trailing newline. The header row is always present.
pub fn encode(readings: &[NormalizedReading], options: &EncodeOptions) -> Result<EncodedPayload> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers()).map_err(encoding_failed)?;
    for reading in readings {
        writer.write_record(row(reading)).map_err(encoding_failed)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))?;
    let mut body =
        String::from_utf8(bytes).map_err(|e| ExportError::EncodingFailed(e.to_string()))?;
    if body.ends_with('\n') {
        body.pop();
    }

    Ok(EncodedPayload {
        body,
        content_type: "text/csv",
        file_name: options
            .file_name
            .clone()
            .unwrap_or_else(|| default_file_name(options.generated_at, "csv")),
        record_count: readings.len(),
    })
}

fn row(reading: &NormalizedReading) -> Vec<String> {
    let timestamp = reading
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut fields = vec![
        reading.sensor_id.to_string(),
        reading.name.clone().unwrap_or_default(),
        timestamp,
    ];
    fields.extend(
        Metric::ALL
            .iter()
            .map(|&m| optional(reading.measurements.get(m))),
    );
    fields.push(optional(reading.location.latitude));
    fields.push(optional(reading.location.longitude));
    fields
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn encoding_failed(err: ::csv::Error) -> ExportError {
    ExportError::EncodingFailed(format!("CSV write failed: {err}"))
}
