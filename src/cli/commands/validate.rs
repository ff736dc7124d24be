//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Lavendair configuration file.

use crate::config::secret::is_blank;
use crate::config::{load_config, LavendairConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        print_summary(&config);
        Ok(0)
    }
}

fn print_summary(config: &LavendairConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  PurpleAir API: {}", config.purpleair.base_url);
    println!(
        "  PurpleAir Key: {}",
        presence(is_blank(config.purpleair.api_key.as_ref()))
    );
    println!("  Eagle.io API: {}", config.eagleio.api_url);
    println!(
        "  Eagle.io Key: {}",
        presence(is_blank(config.eagleio.api_key.as_ref()))
    );
    println!(
        "  AQS Site: {}-{}-{}",
        config.aqs.state_code, config.aqs.county_code, config.aqs.site_number
    );
    println!("  Output Directory: {}", config.export.output_dir);
    println!("  Calibration Factor: {}", config.export.calibration_factor);
    if !config.export.calibration_overrides.is_empty() {
        println!(
            "  Calibration Overrides: {}",
            config.export.calibration_overrides.len()
        );
    }
    println!(
        "  Storage: {:?} ({})",
        config.storage.backend, config.storage.path
    );
    println!();
}

fn presence(blank: bool) -> &'static str {
    if blank {
        "not set"
    } else {
        "set"
    }
}
