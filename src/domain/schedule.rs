//! Recurring export definitions
//!
//! A [`ScheduleDefinition`] is a stored template. Nothing in this crate triggers
//! it; [`ScheduleDefinition::next_run_after`] only computes when it would be due.

use super::ids::{ScheduleId, SensorId};
use super::job::{Destination, ExportFormat};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a schedule recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        f.pad(s)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!(
                "Invalid frequency '{other}' (expected hourly, daily, weekly or monthly)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Active,
    Paused,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleStatus::Active => f.pad("active"),
            ScheduleStatus::Paused => f.pad("paused"),
        }
    }
}

/// Destination-specific credential references
///
/// Secrets are never stored in a schedule. Keys and passwords are referenced by
/// the name of the environment variable that holds them at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRef {
    /// Eagle.io API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the Eagle.io API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// AQS facility (site) identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,

    /// AQS account user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Environment variable holding the AQS password/key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

/// A recurring export template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    pub id: ScheduleId,
    pub name: String,
    pub frequency: Frequency,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
    pub sensors: Vec<SensorId>,
    pub format: ExportFormat,
    pub destination: Destination,
    #[serde(default)]
    pub credentials: CredentialsRef,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

impl ScheduleDefinition {
    /// Creates an active schedule with a fresh id
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        frequency: Frequency,
        time_of_day: NaiveTime,
        sensors: Vec<SensorId>,
        format: ExportFormat,
        destination: Destination,
        credentials: CredentialsRef,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ScheduleId::generate(),
            name: name.into(),
            frequency,
            time_of_day,
            sensors,
            format,
            destination,
            credentials,
            status: ScheduleStatus::Active,
            created_at,
        }
    }

    /// Validates the definition
    ///
    /// # Errors
    ///
    /// Returns an error message if the name is blank or no sensors are selected.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Schedule name cannot be empty".to_string());
        }
        if self.sensors.is_empty() {
            return Err("Schedule must select at least one sensor".to_string());
        }
        Ok(())
    }

    /// Next due time strictly after `now`
    ///
    /// Hourly schedules use only the minute of `time_of_day`. Weekly schedules
    /// recur on the weekday the schedule was created, monthly schedules on the
    /// day of month it was created (clamped to short months).
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let time = self.time_of_day;
        match self.frequency {
            Frequency::Hourly => {
                let candidate = at(now.date_naive(), now.hour(), time.minute());
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::hours(1)
                }
            }
            Frequency::Daily => {
                let candidate = at(now.date_naive(), time.hour(), time.minute());
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            Frequency::Weekly => {
                let target = self.created_at.weekday().num_days_from_monday() as i64;
                let today = now.weekday().num_days_from_monday() as i64;
                let offset = (target - today).rem_euclid(7);
                let candidate = at(
                    now.date_naive() + Duration::days(offset),
                    time.hour(),
                    time.minute(),
                );
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::weeks(1)
                }
            }
            Frequency::Monthly => {
                let day = self.created_at.day();
                let (mut year, mut month) = (now.year(), now.month());
                loop {
                    let candidate = at(clamped_date(year, month, day), time.hour(), time.minute());
                    if candidate > now {
                        return candidate;
                    }
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
            }
        }
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

/// `day` in the given month, or the month's last day if it is shorter
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    (28..=day.max(28))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d.min(day)))
        .unwrap_or(NaiveDate::MIN)
}

/// `HH:MM` serde representation for times of day
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Parses a `HH:MM` time of day
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("Invalid time '{s}' (expected HH:MM)"))
}
