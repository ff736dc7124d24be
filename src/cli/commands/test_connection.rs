//! Test connection command implementation
//!
//! Checks the configured credentials against one external service without
//! exporting anything.

use crate::adapters::aqs::AqsClient;
use crate::adapters::eagleio::{EagleIoClient, EagleIoTarget};
use crate::adapters::purpleair::PurpleAirClient;
use crate::config::{load_config_or_default, LavendairConfig, SecretString};
use crate::domain::{LavendairError, Result, SensorId};
use clap::{Args, ValueEnum};

/// Service to check
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Purpleair,
    Eagleio,
    Aqs,
}

/// Arguments for the test-connection command
#[derive(Args, Debug)]
pub struct TestConnectionArgs {
    /// Service to check
    #[arg(value_enum)]
    pub target: Target,

    /// Sensor index to read (PurpleAir only)
    #[arg(long)]
    pub sensor: Option<u64>,
}

impl TestConnectionArgs {
    /// Execute the test-connection command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        println!("🔌 Testing {:?} connection...", self.target);

        let outcome = match self.target {
            Target::Purpleair => self.check_purpleair(&config).await,
            Target::Eagleio => check_eagleio(&config).await,
            Target::Aqs => check_aqs(&config).await,
        };

        match outcome {
            Ok(detail) => {
                println!("✅ {detail}");
                Ok(0)
            }
            Err(e @ LavendairError::Configuration(_)) => {
                println!("❌ {e}");
                Ok(2)
            }
            Err(e) => {
                tracing::warn!(target_service = ?self.target, error = %e, "Connection test failed");
                println!("❌ {e}");
                Ok(4)
            }
        }
    }

    async fn check_purpleair(&self, config: &LavendairConfig) -> Result<String> {
        let sensor = self.sensor.map(SensorId::new).ok_or_else(|| {
            LavendairError::Configuration("--sensor is required for purpleair".to_string())
        })?;
        let key = required(config.purpleair.api_key.as_ref(), "purpleair.api_key")?;

        let client = PurpleAirClient::new(&config.purpleair)?;
        let name = client.test_connection(sensor, key).await?;
        Ok(format!("Connected to PurpleAir, sensor {sensor} is '{name}'"))
    }
}

async fn check_eagleio(config: &LavendairConfig) -> Result<String> {
    let key = required(config.eagleio.api_key.as_ref(), "eagleio.api_key")?;
    let target = EagleIoTarget {
        api_url: config.eagleio.api_url.clone(),
        api_key: key.clone(),
    };

    EagleIoClient::new(&config.eagleio)?
        .test_connection(&target)
        .await?;
    Ok(format!("Connected to Eagle.io at {}", target.api_url))
}

async fn check_aqs(config: &LavendairConfig) -> Result<String> {
    let email = config
        .aqs
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| LavendairError::Configuration("aqs.email is not set".to_string()))?;
    let key = required(config.aqs.key.as_ref(), "aqs.key")?;

    let status = AqsClient::new(&config.aqs)?.test_connection(email, key).await?;
    Ok(format!("AQS API status: {status}"))
}

fn required<'a>(secret: Option<&'a SecretString>, field: &str) -> Result<&'a SecretString> {
    match secret {
        Some(s) if !crate::config::secret::is_blank(Some(s)) => Ok(s),
        _ => Err(LavendairError::Configuration(format!("{field} is not set"))),
    }
}
