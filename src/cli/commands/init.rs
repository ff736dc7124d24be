//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "lavendair.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Lavendair configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your AQS site codes", self.output);
                println!("  2. Set LAVENDAIR_PURPLEAIR_API_KEY (and LAVENDAIR_EAGLEIO_API_KEY for Eagle.io)");
                println!("  3. Check credentials: lavendair test-connection purpleair --sensor <id>");
                println!("  4. Run an export: lavendair export --sensors <id>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}

fn sample_config() -> &'static str {
    r#"# Lavendair Configuration File
# PurpleAir sensor readings to CSV/JSON files, Eagle.io and EPA AQS

[application]
log_level = "info"

[purpleair]
base_url = "https://api.purpleair.com/v1"
# api_key = "${PURPLEAIR_API_KEY}"
timeout_seconds = 10
average_minutes = 60

[eagleio]
api_url = "https://api.eagle.io/api"
# api_key = "${EAGLEIO_API_KEY}"
timeout_seconds = 30

[aqs]
state_code = "06"
county_code = "001"
site_number = "0001"
submitter_name = "Lavendair User"
submitter_email = "user@example.com"
organization_name = "Lavendair"
api_url = "https://aqs.epa.gov/data/api"
# email = "user@example.com"
# key = "${AQS_API_KEY}"

[export]
output_dir = "./exports"
calibration_factor = 1.0

# Per-sensor factors, keyed by sensor index
[export.calibration_overrides]
# "131075" = 0.52

[storage]
backend = "file"
path = "./.lavendair"
max_write_attempts = 5

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
}
