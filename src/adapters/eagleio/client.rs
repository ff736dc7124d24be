//! Eagle.io HTTP client

use crate::config::{EagleIoConfig, SecretString};
use crate::domain::{ExportError, LavendairError, Result, SourceError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to deliver, with the credential for that delivery
#[derive(Debug, Clone)]
pub struct EagleIoTarget {
    pub api_url: String,
    pub api_key: SecretString,
}

impl EagleIoTarget {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url.trim_end_matches('/'))
    }
}

/// Telemetry platform delivery
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// POST an encoded JSON payload and return the platform's acknowledgement
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::DeliveryFailed`] on transport errors and non-2xx
    /// responses.
    async fn post_data(&self, target: &EagleIoTarget, body: &str) -> Result<Value>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EagleIoClient {
    client: Client,
}

impl EagleIoClient {
    /// Create a client with the configured delivery timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EagleIoConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                LavendairError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Check that the key can list nodes (`GET /v1/nodes`)
    pub async fn test_connection(&self, target: &EagleIoTarget) -> Result<()> {
        let response = self
            .client
            .get(target.endpoint("/v1/nodes"))
            .timeout(CONNECTION_TEST_TIMEOUT)
            .bearer_auth(target.api_key.expose_secret().as_ref())
            .send()
            .await
            .map_err(|e| LavendairError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LavendairError::Source(SourceError::Status {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or(body),
            }));
        }

        tracing::info!(api_url = %target.api_url, "Eagle.io connection OK");
        Ok(())
    }
}

#[async_trait]
impl TelemetryClient for EagleIoClient {
    async fn post_data(&self, target: &EagleIoTarget, body: &str) -> Result<Value> {
        let url = target.endpoint("/v1/nodes/data");
        tracing::debug!(url = %url, bytes = body.len(), "Posting telemetry payload");

        let response = self
            .client
            .post(&url)
            .bearer_auth(target.api_key.expose_secret().as_ref())
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| ExportError::DeliveryFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExportError::DeliveryFailed(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| format!("Eagle.io returned status {status}: {text}"));
            return Err(ExportError::DeliveryFailed(message).into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}
