//! EPA AQS Data Mart connectivity check
//!
//! Submissions themselves are files (see [`crate::core::encode::aqs`]); this
//! adapter only verifies the account used to reach the AQS API.

use crate::config::{AqsConfig, SecretString};
use crate::domain::{LavendairError, Result, SourceError};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AqsClient {
    client: Client,
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AvailabilityResponse {
    #[serde(default)]
    header: Vec<AvailabilityHeader>,
}

#[derive(Debug, Default, Deserialize)]
struct AvailabilityHeader {
    #[serde(default)]
    status: Option<String>,
}

impl AqsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AqsConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(CONNECTION_TEST_TIMEOUT)
            .build()
            .map_err(|e| {
                LavendairError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check the API is up for this account (`GET /metaData/isAvailable`)
    ///
    /// Returns the status line reported by the service.
    pub async fn test_connection(&self, email: &str, key: &SecretString) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/metaData/isAvailable", self.api_url))
            .query(&[("email", email), ("key", key.expose_secret().as_ref())])
            .send()
            .await
            .map_err(|e| LavendairError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(LavendairError::Source(SourceError::Status {
                status: status.as_u16(),
                message: body,
            }));
        }

        let reported = serde_json::from_str::<AvailabilityResponse>(&body)
            .ok()
            .and_then(|r| r.header.into_iter().next())
            .and_then(|h| h.status)
            .unwrap_or_else(|| "available".to_string());

        tracing::info!(api_url = %self.api_url, status = %reported, "AQS connection OK");
        Ok(reported)
    }
}
