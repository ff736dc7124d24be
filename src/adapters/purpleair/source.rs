//! Raw-reading source abstraction

use crate::config::SecretString;
use crate::domain::{LavendairError, RawReading, Result, SensorId, SourceError, TimeRange};
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// What to fetch, and the credential to fetch it with
#[derive(Debug, Clone, Default)]
pub struct ReadingQuery {
    pub sensors: Vec<SensorId>,

    /// `None` fetches each sensor's current reading
    pub range: Option<TimeRange>,

    pub api_key: Option<SecretString>,
}

impl ReadingQuery {
    /// The API key, or [`SourceError::MissingApiKey`] if absent or blank
    pub fn require_api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(LavendairError::Source(SourceError::MissingApiKey))
    }
}

/// Source of raw sensor readings
///
/// Implementations return readings grouped by sensor in the order of
/// `query.sensors`.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch_readings(&self, query: &ReadingQuery) -> Result<Vec<RawReading>>;
}

/// In-memory source for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticReadingSource {
    readings: Vec<RawReading>,
}

impl StaticReadingSource {
    pub fn new(readings: Vec<RawReading>) -> Self {
        Self { readings }
    }
}

#[async_trait]
impl ReadingSource for StaticReadingSource {
    /// Returns the stored readings for the requested sensors
    ///
    /// The range and key are ignored. Readings without a sensor index are
    /// returned only when no sensors are requested.
    async fn fetch_readings(&self, query: &ReadingQuery) -> Result<Vec<RawReading>> {
        if query.sensors.is_empty() {
            return Ok(self.readings.clone());
        }

        Ok(query
            .sensors
            .iter()
            .flat_map(|id| {
                self.readings.iter().filter(move |reading| {
                    reading.sensor.as_ref().and_then(|s| s.sensor_index) == Some(*id)
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::SensorPayload;

    fn raw(id: u64) -> RawReading {
        RawReading::from_sensor(SensorPayload {
            sensor_index: Some(SensorId::new(id)),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_static_source_follows_query_order() {
        let source = StaticReadingSource::new(vec![raw(1), raw(2), raw(3)]);
        let query = ReadingQuery {
            sensors: vec![SensorId::new(3), SensorId::new(1)],
            ..Default::default()
        };

        let readings = source.fetch_readings(&query).await.unwrap();
        let ids: Vec<_> = readings
            .iter()
            .map(|r| r.sensor.as_ref().unwrap().sensor_index.unwrap().value())
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_static_source_empty_selection_returns_all() {
        let source = StaticReadingSource::new(vec![raw(1), RawReading::default()]);
        let readings = source.fetch_readings(&ReadingQuery::default()).await.unwrap();
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_require_api_key() {
        let mut query = ReadingQuery::default();
        assert!(query.require_api_key().is_err());

        query.api_key = Some(secret_string("   ".to_string()));
        assert!(query.require_api_key().is_err());

        query.api_key = Some(secret_string("k".to_string()));
        assert!(query.require_api_key().is_ok());
    }
}
