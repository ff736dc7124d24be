//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{LavendairConfig, StorageBackend};
use super::secret::secret_string;
use crate::domain::errors::LavendairError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`LavendairConfig`]
/// 4. Applies environment variable overrides (`LAVENDAIR_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`LavendairError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use lavendair::config::loader::load_config;
///
/// let config = load_config("lavendair.toml").expect("Failed to load config");
/// println!("Writing exports to {}", config.export.output_dir);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LavendairConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LavendairError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        LavendairError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let config: LavendairConfig = toml::from_str(&contents)
        .map_err(|e| LavendairError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(config)
}

/// Loads the file if it exists, otherwise starts from defaults
///
/// Environment overrides and validation apply either way.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<LavendairConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        finish(LavendairConfig::default())
    }
}

fn finish(mut config: LavendairConfig) -> Result<LavendairConfig> {
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        LavendairError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| LavendairError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed = processed.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed);
    }

    if !missing_vars.is_empty() {
        return Err(LavendairError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `LAVENDAIR_*` prefix
///
/// Variables follow the pattern `LAVENDAIR_<SECTION>_<KEY>`, for example
/// `LAVENDAIR_PURPLEAIR_API_KEY` or `LAVENDAIR_EXPORT_OUTPUT_DIR`.
fn apply_env_overrides(config: &mut LavendairConfig) -> Result<()> {
    // Application
    if let Some(val) = env("LAVENDAIR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // PurpleAir
    if let Some(val) = env("LAVENDAIR_PURPLEAIR_BASE_URL") {
        config.purpleair.base_url = val;
    }
    if let Some(val) = env("LAVENDAIR_PURPLEAIR_API_KEY") {
        config.purpleair.api_key = Some(secret_string(val));
    }
    if let Some(val) = env("LAVENDAIR_PURPLEAIR_TIMEOUT_SECONDS") {
        config.purpleair.timeout_seconds = parse("LAVENDAIR_PURPLEAIR_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = env("LAVENDAIR_PURPLEAIR_AVERAGE_MINUTES") {
        config.purpleair.average_minutes = parse("LAVENDAIR_PURPLEAIR_AVERAGE_MINUTES", &val)?;
    }

    // Eagle.io
    if let Some(val) = env("LAVENDAIR_EAGLEIO_API_URL") {
        config.eagleio.api_url = val;
    }
    if let Some(val) = env("LAVENDAIR_EAGLEIO_API_KEY") {
        config.eagleio.api_key = Some(secret_string(val));
    }
    if let Some(val) = env("LAVENDAIR_EAGLEIO_TIMEOUT_SECONDS") {
        config.eagleio.timeout_seconds = parse("LAVENDAIR_EAGLEIO_TIMEOUT_SECONDS", &val)?;
    }

    // AQS
    if let Some(val) = env("LAVENDAIR_AQS_STATE_CODE") {
        config.aqs.state_code = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_COUNTY_CODE") {
        config.aqs.county_code = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_SITE_NUMBER") {
        config.aqs.site_number = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_SUBMITTER_NAME") {
        config.aqs.submitter_name = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_SUBMITTER_EMAIL") {
        config.aqs.submitter_email = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_ORGANIZATION_NAME") {
        config.aqs.organization_name = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_API_URL") {
        config.aqs.api_url = val;
    }
    if let Some(val) = env("LAVENDAIR_AQS_EMAIL") {
        config.aqs.email = Some(val);
    }
    if let Some(val) = env("LAVENDAIR_AQS_KEY") {
        config.aqs.key = Some(secret_string(val));
    }

    // Export
    if let Some(val) = env("LAVENDAIR_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Some(val) = env("LAVENDAIR_EXPORT_CALIBRATION_FACTOR") {
        config.export.calibration_factor = parse("LAVENDAIR_EXPORT_CALIBRATION_FACTOR", &val)?;
    }

    // Storage
    if let Some(val) = env("LAVENDAIR_STORAGE_BACKEND") {
        config.storage.backend = match val.to_lowercase().as_str() {
            "file" => StorageBackend::File,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(LavendairError::Configuration(format!(
                    "Invalid LAVENDAIR_STORAGE_BACKEND '{other}'. Must be one of: file, memory"
                )))
            }
        };
    }
    if let Some(val) = env("LAVENDAIR_STORAGE_PATH") {
        config.storage.path = val;
    }

    // Logging
    if let Some(val) = env("LAVENDAIR_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse("LAVENDAIR_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env("LAVENDAIR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("LAVENDAIR_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        LavendairError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}
