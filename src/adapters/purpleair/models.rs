//! PurpleAir API models
//!
//! The single-sensor endpoint returns a nested `sensor` object, which
//! deserializes straight into [`RawReading`](crate::domain::RawReading).
//! The multi-sensor and history endpoints return a columnar table: a `fields`
//! header plus one array per row. [`ColumnarResponse`] reshapes those rows into
//! [`SensorPayload`] values.

use crate::domain::{SensorId, SensorPayload};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields requested for every reading
pub const READING_FIELDS: &str =
    "name,last_seen,latitude,longitude,pm1.0_atm,pm2.5_atm,pm10.0_atm,humidity,temperature,pressure";

/// Fields requested for history rows (the row timestamp comes back as `time_stamp`)
pub const HISTORY_FIELDS: &str = "pm1.0_atm,pm2.5_atm,pm10.0_atm,humidity,temperature,pressure";

/// Fields requested by the connection test
pub const CONNECTION_TEST_FIELDS: &str = "name,last_seen";

/// Columnar response from `/sensors` and `/sensors/{id}/history`
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnarResponse {
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub time_stamp: Option<i64>,

    /// Present on history responses only
    #[serde(default)]
    pub sensor_index: Option<SensorId>,

    pub fields: Vec<String>,

    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl ColumnarResponse {
    /// Reshape each row into a sensor payload
    ///
    /// A history row's `time_stamp` becomes the payload's `last_seen`, and the
    /// response-level `sensor_index` fills in rows that do not carry one.
    ///
    /// # Errors
    ///
    /// Returns a message if a row is longer than the header or a value has the
    /// wrong type for its field.
    pub fn rows(&self) -> Result<Vec<SensorPayload>, String> {
        self.data
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if row.len() > self.fields.len() {
                    return Err(format!(
                        "Row {index} has {} values for {} fields",
                        row.len(),
                        self.fields.len()
                    ));
                }

                let mut object = Map::with_capacity(row.len() + 1);
                for (field, value) in self.fields.iter().zip(row) {
                    let key = if field == "time_stamp" {
                        "last_seen"
                    } else {
                        field.as_str()
                    };
                    object.insert(key.to_string(), value.clone());
                }
                if let Some(sensor_index) = self.sensor_index {
                    object
                        .entry("sensor_index")
                        .or_insert_with(|| Value::from(sensor_index.value()));
                }

                serde_json::from_value(Value::Object(object))
                    .map_err(|e| format!("Row {index}: {e}"))
            })
            .collect()
    }
}

/// Error body returned by the API on non-success statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message, preferring `description`
    pub fn message(&self) -> Option<String> {
        self.description
            .clone()
            .or_else(|| self.error.clone())
            .filter(|m| !m.trim().is_empty())
    }
}
