//! JSON encoder

use super::{default_file_name, EncodeOptions, EncodedPayload};
use crate::domain::{ExportError, NormalizedReading, Result};

/// Encode readings as a pretty-printed JSON array (2-space indent)
pub fn encode(readings: &[NormalizedReading], options: &EncodeOptions) -> Result<EncodedPayload> {
    let body = serde_json::to_string_pretty(readings)
        .map_err(|e| ExportError::EncodingFailed(format!("JSON serialization failed: {e}")))?;

    Ok(EncodedPayload {
        body,
        content_type: "application/json",
        file_name: options
            .file_name
            .clone()
            .unwrap_or_else(|| default_file_name(options.generated_at, "json")),
        record_count: readings.len(),
    })
}
