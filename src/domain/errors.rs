//! Domain error types
//!
//! This module defines the error hierarchy for Lavendair.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Lavendair error type
///
/// This is the primary error type used throughout the application.
/// It wraps the boundary-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum LavendairError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed raw reading (missing sensor identifier or payload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sensor API errors
    #[error("Sensor source error: {0}")]
    Source(#[from] SourceError),

    /// Encoding and delivery errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Key-value persistence errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Illegal job state transitions
    #[error("State error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl LavendairError {
    /// Message stored on a failed export job.
    ///
    /// Export errors are reported without the outer prefix so that a delivery
    /// failure reads as the remote system's own message.
    pub fn job_message(&self) -> String {
        match self {
            LavendairError::Export(inner) => inner.to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors surfaced by the export pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Destination is not one of download, eagle_io or aqs
    #[error("Unsupported destination: {0}")]
    UnsupportedDestination(String),

    /// The remote platform rejected or never acknowledged the payload
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// The reading batch could not be serialized
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Sensor API errors
///
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No API key was supplied with the request
    #[error("PurpleAir API key not set")]
    MissingApiKey,

    /// Failed to reach the sensor API
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The sensor API answered with a non-success status
    #[error("Sensor API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a key failed
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Writing a key failed
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Stored content could not be decoded
    #[error("Corrupt entry '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Concurrent writers kept invalidating our version
    #[error("Write conflict on '{key}' after {attempts} attempts")]
    Conflict { key: String, attempts: usize },

    /// Key contains characters the backend cannot store
    #[error("Invalid key '{0}'")]
    InvalidKey(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for LavendairError {
    fn from(err: std::io::Error) -> Self {
        LavendairError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LavendairError {
    fn from(err: serde_json::Error) -> Self {
        LavendairError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for LavendairError {
    fn from(err: toml::de::Error) -> Self {
        LavendairError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lavendair_error_display() {
        let err = LavendairError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_export_error_conversion() {
        let export_err = ExportError::DeliveryFailed("Invalid API key".to_string());
        let err: LavendairError = export_err.into();
        assert!(matches!(
            err,
            LavendairError::Export(ExportError::DeliveryFailed(_))
        ));
    }

    #[test]
    fn test_job_message_strips_export_prefix() {
        let err: LavendairError = ExportError::DeliveryFailed("Invalid API key".to_string()).into();
        assert_eq!(err.job_message(), "Delivery failed: Invalid API key");

        let err = LavendairError::InvalidInput("missing sensor".to_string());
        assert_eq!(err.job_message(), "Invalid input: missing sensor");
    }

    #[test]
    fn test_source_error_conversion() {
        let err: LavendairError = SourceError::MissingApiKey.into();
        assert!(matches!(err, LavendairError::Source(_)));
        assert!(err.to_string().contains("API key not set"));
    }

    #[test]
    fn test_store_conflict_display() {
        let err = StoreError::Conflict {
            key: "exportHistory".to_string(),
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "Write conflict on 'exportHistory' after 5 attempts"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: LavendairError = io_err.into();
        assert!(matches!(err, LavendairError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: LavendairError = json_err.into();
        assert!(matches!(err, LavendairError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: LavendairError = toml_err.into();
        assert!(matches!(err, LavendairError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_lavendair_error_implements_std_error() {
        let err = LavendairError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
