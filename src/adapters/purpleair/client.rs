//! PurpleAir REST client

use super::models::{
    ColumnarResponse, ErrorBody, CONNECTION_TEST_FIELDS, HISTORY_FIELDS, READING_FIELDS,
};
use super::source::{ReadingQuery, ReadingSource};
use crate::config::{PurpleAirConfig, SecretString};
use crate::domain::{LavendairError, RawReading, Result, SensorId, SensorPayload, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the PurpleAir v1 API
///
/// The API key travels with each call; the client itself holds no credential.
///
/// # Example
///
/// ```no_run
/// use lavendair::adapters::purpleair::PurpleAirClient;
/// use lavendair::config::{secret_string, PurpleAirConfig};
/// use lavendair::domain::SensorId;
///
/// # async fn example() -> lavendair::domain::Result<()> {
/// let client = PurpleAirClient::new(&PurpleAirConfig::default())?;
/// let key = secret_string("read-key".to_string());
/// let reading = client.get_sensor(SensorId::new(131075), &key).await?;
/// println!("{:?}", reading.sensor);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PurpleAirClient {
    client: Client,
    base_url: String,
    average_minutes: u32,
}

impl PurpleAirClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &PurpleAirConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                LavendairError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            average_minutes: config.average_minutes,
        })
    }

    /// Current reading for one sensor (`GET /sensors/{id}`)
    pub async fn get_sensor(&self, id: SensorId, api_key: &SecretString) -> Result<RawReading> {
        self.get_sensor_fields(id, READING_FIELDS, api_key).await
    }

    async fn get_sensor_fields(
        &self,
        id: SensorId,
        fields: &str,
        api_key: &SecretString,
    ) -> Result<RawReading> {
        let request = self
            .client
            .get(format!("{}/sensors/{id}", self.base_url))
            .query(&[("fields", fields)]);

        let mut reading: RawReading = self.send(request, api_key).await?;
        // The nested payload omits the index unless it was requested
        if let Some(sensor) = reading.sensor.as_mut() {
            sensor.sensor_index.get_or_insert(id);
        }
        Ok(reading)
    }

    /// Current readings for several sensors in one call (`GET /sensors?show_only=`)
    ///
    /// Results follow the order the API returns, which is not necessarily the
    /// order of `ids`.
    pub async fn get_sensors(
        &self,
        ids: &[SensorId],
        api_key: &SecretString,
    ) -> Result<Vec<RawReading>> {
        let show_only = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fields = format!("sensor_index,{READING_FIELDS}");

        let request = self
            .client
            .get(format!("{}/sensors", self.base_url))
            .query(&[("show_only", show_only.as_str()), ("fields", fields.as_str())]);

        let response: ColumnarResponse = self.send(request, api_key).await?;
        let rows = response
            .rows()
            .map_err(|e| LavendairError::Source(SourceError::InvalidResponse(e)))?;

        Ok(rows
            .into_iter()
            .map(|sensor| RawReading {
                api_version: response.api_version.clone(),
                time_stamp: response.time_stamp,
                sensor: Some(sensor),
            })
            .collect())
    }

    /// Averaged history rows for one sensor (`GET /sensors/{id}/history`)
    ///
    /// Each row's `last_seen` is the start of its averaging window.
    pub async fn get_sensor_history(
        &self,
        id: SensorId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        api_key: &SecretString,
    ) -> Result<Vec<SensorPayload>> {
        let request = self
            .client
            .get(format!("{}/sensors/{id}/history", self.base_url))
            .query(&[
                ("start_timestamp", start.timestamp().to_string()),
                ("end_timestamp", end.timestamp().to_string()),
                ("average", self.average_minutes.to_string()),
                ("fields", HISTORY_FIELDS.to_string()),
            ]);

        let response: ColumnarResponse = self.send(request, api_key).await?;
        let mut rows = response
            .rows()
            .map_err(|e| LavendairError::Source(SourceError::InvalidResponse(e)))?;
        for row in &mut rows {
            row.sensor_index.get_or_insert(id);
        }

        tracing::debug!(sensor_id = %id, rows = rows.len(), "Fetched sensor history");
        Ok(rows)
    }

    /// Check that the key can read a sensor
    ///
    /// Returns the sensor name on success.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] carrying the API's `description` when it rejects the key.
    pub async fn test_connection(&self, id: SensorId, api_key: &SecretString) -> Result<String> {
        let reading = self
            .get_sensor_fields(id, CONNECTION_TEST_FIELDS, api_key)
            .await?;
        let name = reading
            .sensor
            .and_then(|s| s.name)
            .unwrap_or_else(|| id.to_string());

        tracing::info!(sensor_id = %id, sensor_name = %name, "PurpleAir connection OK");
        Ok(name)
    }

    /// Readings for one sensor: the averaged history when a range is given,
    /// the current reading otherwise
    async fn readings_for(
        &self,
        id: SensorId,
        query: &ReadingQuery,
        api_key: &SecretString,
    ) -> Result<Vec<RawReading>> {
        let Some(range) = query.range else {
            return Ok(vec![self.get_sensor(id, api_key).await?]);
        };

        // History rows carry no name or position, take those from the sensor itself
        let (current, history) = futures::try_join!(
            self.get_sensor(id, api_key),
            self.get_sensor_history(id, range.start, range.end, api_key)
        )?;
        let meta = current.sensor.unwrap_or_default();

        Ok(history
            .into_iter()
            .map(|mut row| {
                row.name = row.name.or_else(|| meta.name.clone());
                row.latitude = row.latitude.or(meta.latitude);
                row.longitude = row.longitude.or(meta.longitude);
                RawReading {
                    api_version: current.api_version.clone(),
                    time_stamp: current.time_stamp,
                    sensor: Some(row),
                }
            })
            .collect())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        api_key: &SecretString,
    ) -> Result<T> {
        let response = request
            .header("X-API-Key", api_key.expose_secret().as_ref())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| LavendairError::Source(SourceError::RequestFailed(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message())
                .unwrap_or(body);

            tracing::warn!(status = status.as_u16(), error = %message, "PurpleAir request failed");
            return Err(LavendairError::Source(SourceError::Status {
                status: status.as_u16(),
                message,
            }));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LavendairError::Source(SourceError::InvalidResponse(e.to_string())))
    }
}

#[async_trait]
impl ReadingSource for PurpleAirClient {
    async fn fetch_readings(&self, query: &ReadingQuery) -> Result<Vec<RawReading>> {
        let api_key = query.require_api_key()?;

        tracing::info!(
            sensors = query.sensors.len(),
            historical = query.range.is_some(),
            "Fetching readings from PurpleAir"
        );

        // Concurrent per-sensor fetches; try_join_all keeps the requested order
        let per_sensor = try_join_all(
            query
                .sensors
                .iter()
                .map(|id| self.readings_for(*id, query, api_key)),
        )
        .await?;

        Ok(per_sensor.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::TimeRange;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> PurpleAirClient {
        PurpleAirClient::new(&PurpleAirConfig {
            base_url: server.url(),
            ..Default::default()
        })
        .unwrap()
    }

    fn key() -> SecretString {
        secret_string("read-key".to_string())
    }

    #[tokio::test]
    async fn test_get_sensor_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sensors/131075")
            .match_header("X-API-Key", "read-key")
            .match_query(Matcher::UrlEncoded(
                "fields".into(),
                READING_FIELDS.into(),
            ))
            .with_status(200)
            .with_body(
                r#"{"api_version":"V1","time_stamp":1717243200,
                    "sensor":{"name":"Mission","last_seen":1717243100,"pm2.5_atm":12.3}}"#,
            )
            .create_async()
            .await;

        let reading = client(&server).get_sensor(SensorId::new(131075), &key()).await.unwrap();
        mock.assert_async().await;

        let sensor = reading.sensor.unwrap();
        assert_eq!(sensor.sensor_index, Some(SensorId::new(131075)));
        assert_eq!(sensor.pm2_5_atm, Some(12.3));
    }

    #[tokio::test]
    async fn test_error_uses_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sensors/1")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":"ApiKeyInvalidError","description":"The provided api_key was not valid."}"#)
            .create_async()
            .await;

        let err = client(&server)
            .test_connection(SensorId::new(1), &key())
            .await
            .unwrap_err();

        match err {
            LavendairError::Source(SourceError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "The provided api_key was not valid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_sensors_reshapes_columns() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sensors")
            .match_query(Matcher::UrlEncoded("show_only".into(), "1,2".into()))
            .with_status(200)
            .with_body(
                r#"{"time_stamp":1717243200,
                    "fields":["sensor_index","name","pm2.5_atm"],
                    "data":[[1,"A",5.5],[2,"B",6.5]]}"#,
            )
            .create_async()
            .await;

        let readings = client(&server)
            .get_sensors(&[SensorId::new(1), SensorId::new(2)], &key())
            .await
            .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].time_stamp, Some(1717243200));
        assert_eq!(readings[1].sensor.as_ref().unwrap().name.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_fetch_history_merges_sensor_metadata() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sensors/7")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"sensor":{"name":"Harbor","latitude":37.8,"longitude":-122.3}}"#)
            .create_async()
            .await;
        let history = server
            .mock("GET", "/sensors/7/history")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_timestamp".into(), "1717200000".into()),
                Matcher::UrlEncoded("average".into(), "60".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"sensor_index":7,"fields":["time_stamp","pm2.5_atm"],
                    "data":[[1717200000,4.0],[1717203600,4.5]]}"#,
            )
            .create_async()
            .await;

        let start = Utc.timestamp_opt(1717200000, 0).unwrap();
        let query = ReadingQuery {
            sensors: vec![SensorId::new(7)],
            range: Some(TimeRange::new(start, start + chrono::Duration::hours(2)).unwrap()),
            api_key: Some(key()),
        };

        let readings = client(&server).fetch_readings(&query).await.unwrap();
        history.assert_async().await;

        assert_eq!(readings.len(), 2);
        let first = readings[0].sensor.as_ref().unwrap();
        assert_eq!(first.name.as_deref(), Some("Harbor"));
        assert_eq!(first.latitude, Some(37.8));
        assert_eq!(first.last_seen, Some(1717200000));
    }

    #[tokio::test]
    async fn test_fetch_keeps_requested_order() {
        let mut server = mockito::Server::new_async().await;
        for (id, name) in [(3, "Third"), (1, "First")] {
            server
                .mock("GET", format!("/sensors/{id}").as_str())
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(format!(r#"{{"sensor":{{"name":"{name}"}}}}"#))
                .create_async()
                .await;
        }

        let query = ReadingQuery {
            sensors: vec![SensorId::new(3), SensorId::new(1)],
            range: None,
            api_key: Some(key()),
        };
        let readings = client(&server).fetch_readings(&query).await.unwrap();

        let names: Vec<_> = readings
            .iter()
            .map(|r| r.sensor.as_ref().unwrap().name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Third", "First"]);
    }

    #[tokio::test]
    async fn test_fetch_without_key() {
        let client = PurpleAirClient::new(&PurpleAirConfig::default()).unwrap();
        let query = ReadingQuery {
            sensors: vec![SensorId::new(1)],
            range: None,
            api_key: None,
        };

        let err = client.fetch_readings(&query).await.unwrap_err();
        assert!(matches!(err, LavendairError::Source(SourceError::MissingApiKey)));
    }
}
