//! Eagle.io telemetry platform adapter
//!
//! Delivery target for the telemetry payload produced by
//! [`crate::core::encode::telemetry`].

pub mod client;

pub use client::{EagleIoClient, EagleIoTarget, TelemetryClient};
