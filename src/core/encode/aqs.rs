//! EPA AQS XML submission encoder
//!
//! Field order inside `<Record>` is fixed; downstream consumers parse
//! positionally-sensitive schema variants.

use super::{EncodeOptions, EncodedPayload};
use crate::domain::{NormalizedReading, Result};
use chrono::{DateTime, SecondsFormat, Utc};

pub const SUBMISSION_PREFIX: &str = "LAVENDAIR";
pub const PARAMETER_CODE_PM25: &str = "88101";
pub const UNITS_OF_MEASURE: &str = "Micrograms/cubic meter (LC)";

/// Site and submitter details embedded in a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqsOptions {
    pub state_code: String,
    pub county_code: String,
    pub site_number: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub organization_name: String,
}

impl Default for AqsOptions {
    fn default() -> Self {
        Self {
            state_code: "06".to_string(),
            county_code: "001".to_string(),
            site_number: "0001".to_string(),
            submitter_name: "Lavendair User".to_string(),
            submitter_email: "user@example.com".to_string(),
            organization_name: "Lavendair".to_string(),
        }
    }
}

/// `LAVENDAIR_<epoch millis>`
pub fn submission_id(generated_at: DateTime<Utc>) -> String {
    format!("{SUBMISSION_PREFIX}_{}", generated_at.timestamp_millis())
}

/// Encode readings as an AQS XML submission
///
/// One `<Record>` is emitted per reading. A missing PM2.5 value is written as an
/// empty `<SampleValue></SampleValue>` element; every other fixed field is still
/// present.
pub fn encode(readings: &[NormalizedReading], options: &EncodeOptions) -> Result<EncodedPayload> {
    let aqs = &options.aqs;
    let submission_id = submission_id(options.generated_at);

    let mut xml = String::with_capacity(512 + readings.len() * 900);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(
        "<AQSSubmission xmlns=\"http://www.epa.gov/aqs\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n",
    );
    xml.push_str("  <Header>\n");
    element(&mut xml, 4, "SubmissionId", &submission_id);
    element(
        &mut xml,
        4,
        "SubmissionDate",
        &options
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    element(&mut xml, 4, "SubmitterName", &aqs.submitter_name);
    element(&mut xml, 4, "SubmitterEmail", &aqs.submitter_email);
    element(&mut xml, 4, "OrganizationName", &aqs.organization_name);
    xml.push_str("  </Header>\n");
    xml.push_str("  <RawData>\n");
    for reading in readings {
        record(&mut xml, reading, aqs);
    }
    xml.push_str("  </RawData>\n");
    xml.push_str("</AQSSubmission>");

    Ok(EncodedPayload {
        body: xml,
        content_type: "application/xml",
        file_name: format!("AQS_Export_{submission_id}.xml"),
        record_count: readings.len(),
    })
}

fn record(xml: &mut String, reading: &NormalizedReading, aqs: &AqsOptions) {
    let collected = reading.last_seen.unwrap_or(reading.timestamp);

    xml.push_str("    <Record>\n");
    element(xml, 6, "StateCode", &aqs.state_code);
    element(xml, 6, "CountyCode", &aqs.county_code);
    element(xml, 6, "SiteNumber", &aqs.site_number);
    element(xml, 6, "ParameterCode", PARAMETER_CODE_PM25);
    element(xml, 6, "POC", "1");
    element(xml, 6, "Latitude", &number(reading.location.latitude));
    element(xml, 6, "Longitude", &number(reading.location.longitude));
    element(xml, 6, "Datum", "WGS84");
    element(xml, 6, "CollectionDate", &collected.format("%Y-%m-%d").to_string());
    element(xml, 6, "CollectionTime", &collected.format("%H:%M:%S").to_string());
    element(xml, 6, "SampleValue", &number(reading.measurements.pm2_5));
    element(xml, 6, "UnitsOfMeasure", UNITS_OF_MEASURE);
    element(xml, 6, "MDL", "0.1");
    element(xml, 6, "MethodType", "FEM");
    element(xml, 6, "MethodCode", "170");
    element(xml, 6, "MethodDescription", "PurpleAir Sensor");
    element(xml, 6, "SampleDuration", "1 HOUR");
    element(xml, 6, "SampleFrequency", "CONTINUOUS");
    xml.push_str("    </Record>\n");
}

fn element(xml: &mut String, indent: usize, tag: &str, value: &str) {
    xml.extend(std::iter::repeat(' ').take(indent));
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escape_xml(value));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Escapes the five XML special characters
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
