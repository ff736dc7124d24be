//! Domain identifier types with validation
//!
//! Newtype wrappers for sensor, job and schedule identifiers. Each type keeps
//! the identifiers from being mixed up and validates its format on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PurpleAir sensor index
///
/// PurpleAir identifies sensors by a positive integer index.
///
/// # Examples
///
/// ```
/// use lavendair::domain::ids::SensorId;
/// use std::str::FromStr;
///
/// let id = SensorId::from_str("131075").unwrap();
/// assert_eq!(id.value(), 131075);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(u64);

impl SensorId {
    /// Creates a new SensorId
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    /// Returns the numeric sensor index
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Parses a comma-separated list such as `"1, 2,3"`
    pub fn parse_list(input: &str) -> Result<Vec<Self>, String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from_str)
            .collect()
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SensorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("Invalid sensor ID '{s}': expected a numeric sensor index"))
    }
}

impl From<u64> for SensorId {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

/// Export job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a JobId from an existing string
    ///
    /// # Returns
    ///
    /// Returns `Ok(JobId)` if the ID is non-empty, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a fresh random job ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Schedule definition identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(String);

impl ScheduleId {
    /// Creates a ScheduleId from an existing string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Schedule ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a fresh random schedule ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the schedule ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScheduleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ScheduleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
