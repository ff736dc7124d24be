//! Export orchestrator - drives one export job end to end
//!
//! The orchestrator owns every [`ExportJob`] state transition:
//!
//! 1. `queued → processing`
//! 2. Fetch raw readings for the selected sensors
//! 3. Normalize each reading with its calibration factor
//! 4. Encode the batch for the destination
//! 5. Deliver: write a file, or POST to Eagle.io
//! 6. `processing → completed | failed`, then append one history record
//!
//! Errors never escape to the caller; they end up as the message on a failed job.

use super::request::ExportRequest;
use crate::adapters::eagleio::{EagleIoClient, EagleIoTarget, TelemetryClient};
use crate::adapters::purpleair::{PurpleAirClient, ReadingQuery, ReadingSource};
use crate::adapters::store::create_store;
use crate::config::{ExportConfig, LavendairConfig};
use crate::core::encode::{self, AqsOptions, EncodeOptions, EncodedPayload, Encoding};
use crate::core::normalize::normalize;
use crate::core::state::ExportHistoryLedger;
use crate::domain::{
    default_job_name, Destination, ExportError, ExportFormat, ExportHistoryRecord, ExportJob,
    HistoryStatus, LavendairError, NormalizedReading, Result,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Settings the orchestrator takes from configuration
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Where download and AQS files are written
    pub output_dir: PathBuf,

    /// Default and per-sensor calibration factors
    pub export: ExportConfig,

    pub aqs: AqsOptions,

    /// Used when a request carries no Eagle.io URL of its own
    pub eagleio_api_url: String,
}

impl OrchestratorSettings {
    pub fn from_config(config: &LavendairConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.export.output_dir),
            export: config.export.clone(),
            aqs: config.aqs.to_options(),
            eagleio_api_url: config.eagleio.api_url.clone(),
        }
    }
}

/// A started export
///
/// `job` is the snapshot taken while still queued. `updates` observes every
/// later transition.
pub struct ExportTicket {
    pub job: ExportJob,
    pub updates: watch::Receiver<ExportJob>,
    handle: JoinHandle<ExportJob>,
}

impl ExportTicket {
    /// Wait for the job to reach a terminal state
    ///
    /// # Errors
    ///
    /// Returns an error only if the background task panicked or was aborted.
    pub async fn wait(self) -> Result<ExportJob> {
        self.handle
            .await
            .map_err(|e| LavendairError::Other(format!("Export task did not finish: {e}")))
    }
}

/// What delivery produced
#[derive(Debug)]
struct Delivery {
    record_count: usize,
    output_size: usize,
    output_path: Option<String>,
    acknowledgement: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ExportOrchestrator {
    source: Arc<dyn ReadingSource>,
    telemetry: Arc<dyn TelemetryClient>,
    ledger: ExportHistoryLedger,
    settings: Arc<OrchestratorSettings>,
}

impl ExportOrchestrator {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        telemetry: Arc<dyn TelemetryClient>,
        ledger: ExportHistoryLedger,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            source,
            telemetry,
            ledger,
            settings: Arc::new(settings),
        }
    }

    /// Wire up the PurpleAir source, Eagle.io client and configured store
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the store cannot be
    /// opened.
    pub async fn from_config(config: &LavendairConfig) -> Result<Self> {
        let source = Arc::new(PurpleAirClient::new(&config.purpleair)?);
        let telemetry = Arc::new(EagleIoClient::new(&config.eagleio)?);
        let store = create_store(&config.storage).await?;
        let ledger = ExportHistoryLedger::new(store, config.storage.max_write_attempts);

        Ok(Self::new(
            source,
            telemetry,
            ledger,
            OrchestratorSettings::from_config(config),
        ))
    }

    pub fn ledger(&self) -> &ExportHistoryLedger {
        &self.ledger
    }

    /// Start an export in the background
    ///
    /// Returns immediately with the job still `queued`. Must be called from
    /// within a Tokio runtime.
    pub fn run_export(&self, request: ExportRequest) -> ExportTicket {
        let job = self.new_job(&request);
        let (sender, updates) = watch::channel(job.clone());

        let orchestrator = self.clone();
        let queued = job.clone();
        let handle = tokio::spawn(async move { orchestrator.drive(job, request, &sender).await });

        ExportTicket {
            job: queued,
            updates,
            handle,
        }
    }

    /// Run an export to completion
    ///
    /// The returned job is always terminal.
    pub async fn execute(&self, request: ExportRequest) -> ExportJob {
        let job = self.new_job(&request);
        let (sender, _updates) = watch::channel(job.clone());
        self.drive(job, request, &sender).await
    }

    fn new_job(&self, request: &ExportRequest) -> ExportJob {
        let created_at = Utc::now();
        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_job_name(created_at));

        ExportJob::new(
            name,
            request.format.clone(),
            request.destination.clone(),
            request.job_type,
            created_at,
        )
    }

    async fn drive(
        &self,
        mut job: ExportJob,
        request: ExportRequest,
        updates: &watch::Sender<ExportJob>,
    ) -> ExportJob {
        if let Err(e) = job.mark_processing(Utc::now()) {
            tracing::error!(job_id = %job.id, error = %e, "Job could not start");
            return job;
        }
        updates.send_replace(job.clone());
        crate::log_export_start!(job.id, job.destination, job.format);

        let outcome = self.process(&request).await;

        let finished_at = Utc::now();
        let transition = match outcome {
            Ok(delivery) => {
                job.output_path = delivery.output_path;
                job.acknowledgement = delivery.acknowledgement;
                job.mark_completed(delivery.record_count, delivery.output_size, finished_at)
            }
            Err(e) => job.mark_failed(e.job_message(), finished_at),
        };
        if let Err(e) = transition {
            tracing::error!(job_id = %job.id, error = %e, "Job could not finish");
            return job;
        }

        match &job.error {
            Some(error) => {
                crate::log_export_failed!(job.id, error);
            }
            None => {
                crate::log_export_complete!(
                    job.id,
                    job.record_count.unwrap_or_default(),
                    job.duration_ms().unwrap_or_default()
                );
            }
        }

        self.record(&job).await;
        updates.send_replace(job.clone());
        job
    }

    async fn process(&self, request: &ExportRequest) -> Result<Delivery> {
        let destination: Destination = request.destination.parse()?;
        let format: ExportFormat = request
            .format
            .parse()
            .map_err(LavendairError::Validation)?;
        if request.sensors.is_empty() {
            return Err(LavendairError::Validation(
                "No sensors selected for export".to_string(),
            ));
        }

        let query = ReadingQuery {
            sensors: request.sensor_ids(),
            range: request.range,
            api_key: request.credentials.purpleair_api_key.clone(),
        };
        let raws = self.source.fetch_readings(&query).await?;

        let captured_at = Utc::now();
        let readings = raws
            .iter()
            .map(|raw| {
                let factor = raw
                    .sensor
                    .as_ref()
                    .and_then(|s| s.sensor_index)
                    .map(|id| {
                        request
                            .calibration_for(id)
                            .unwrap_or_else(|| self.settings.export.calibration_for(id))
                    })
                    .unwrap_or(self.settings.export.calibration_factor);
                normalize(raw, factor, captured_at)
            })
            .collect::<Result<Vec<NormalizedReading>>>()?;

        tracing::debug!(
            fetched = raws.len(),
            normalized = readings.len(),
            "Normalized readings"
        );

        let mut options = EncodeOptions::new(captured_at);
        options.aqs = self.settings.aqs.clone();
        if let Some(site) = request.site_number.as_ref().filter(|s| !s.trim().is_empty()) {
            options.aqs.site_number = site.clone();
        }
        options.file_name = request.file_name.clone();

        let payload = encode::encode(
            &readings,
            Encoding::for_job(format, destination),
            &options,
        )?;

        match destination {
            Destination::Download | Destination::Aqs => self.write_file(payload).await,
            Destination::EagleIo => self.post_telemetry(request, payload).await,
        }
    }

    async fn write_file(&self, payload: EncodedPayload) -> Result<Delivery> {
        let file_name = checked_file_name(&payload.file_name)?;
        let dir = &self.settings.output_dir;
        let path = dir.join(file_name);

        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ExportError::DeliveryFailed(format!("Failed to create {}: {e}", dir.display()))
        })?;
        tokio::fs::write(&path, payload.body.as_bytes())
            .await
            .map_err(|e| {
                ExportError::DeliveryFailed(format!("Failed to write {}: {e}", path.display()))
            })?;

        tracing::info!(
            path = %path.display(),
            bytes = payload.size(),
            content_type = payload.content_type,
            "Export file written"
        );

        Ok(Delivery {
            record_count: payload.record_count,
            output_size: payload.size(),
            output_path: Some(path.display().to_string()),
            acknowledgement: None,
        })
    }

    async fn post_telemetry(
        &self,
        request: &ExportRequest,
        payload: EncodedPayload,
    ) -> Result<Delivery> {
        let api_key = request
            .credentials
            .eagleio_api_key
            .clone()
            .ok_or_else(|| LavendairError::Configuration("Eagle.io API key not set".to_string()))?;
        let target = EagleIoTarget {
            api_url: request
                .credentials
                .eagleio_api_url
                .clone()
                .unwrap_or_else(|| self.settings.eagleio_api_url.clone()),
            api_key,
        };

        let acknowledgement = self.telemetry.post_data(&target, &payload.body).await?;

        Ok(Delivery {
            record_count: payload.record_count,
            output_size: payload.size(),
            output_path: None,
            acknowledgement: Some(acknowledgement),
        })
    }

    /// Append the job's history record; a ledger failure is logged, not raised
    async fn record(&self, job: &ExportJob) {
        let status = if job.error.is_some() {
            HistoryStatus::Failed
        } else {
            HistoryStatus::Success
        };
        let record = ExportHistoryRecord {
            id: job.id.clone(),
            destination: history_destination(job),
            job_type: job.job_type,
            status,
            records_exported: job.record_count.unwrap_or_default(),
            timestamp: job.completed_at.unwrap_or(job.created_at),
            duration_ms: job.duration_ms().unwrap_or_default(),
            error: job.error.clone(),
        };

        if let Err(e) = self.ledger.append(record).await {
            crate::log_error_with_context!(e, "Failed to append export history");
        }
    }
}

/// Ledger label: `CSV Download`, `JSON Download`, `Eagle.io`, `AQS`
///
/// Unknown destinations are recorded as requested.
fn history_destination(job: &ExportJob) -> String {
    match job.destination.parse::<Destination>() {
        Ok(destination) => match job.format.parse::<ExportFormat>() {
            Ok(format) => destination.history_label(format).to_string(),
            Err(_) if destination == Destination::Download => "Download".to_string(),
            Err(_) => destination.history_label(ExportFormat::Csv).to_string(),
        },
        Err(_) => job.destination.clone(),
    }
}

/// Rejects names that would escape the output directory
fn checked_file_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let path = Path::new(trimmed);
    let single_component = path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);
    if trimmed.is_empty() || !single_component || trimmed == ".." {
        return Err(LavendairError::Validation(format!(
            "Invalid output file name '{name}'"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::purpleair::StaticReadingSource;
    use crate::adapters::store::MemoryStore;
    use crate::config::secret_string;
    use crate::domain::{JobStatus, JobType, RawReading, SensorId, SensorPayload};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every POST and answers with a fixed result
    struct RecordingTelemetry {
        bodies: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    impl RecordingTelemetry {
        fn ok() -> Self {
            Self {
                bodies: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                bodies: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl TelemetryClient for RecordingTelemetry {
        async fn post_data(&self, _target: &EagleIoTarget, body: &str) -> Result<serde_json::Value> {
            self.bodies.lock().unwrap().push(body.to_string());
            match &self.fail_with {
                Some(message) => Err(ExportError::DeliveryFailed(message.clone()).into()),
                None => Ok(serde_json::json!({"status": "ok"})),
            }
        }
    }

    fn raw(id: u64, pm2_5: f64) -> RawReading {
        RawReading::from_sensor(SensorPayload {
            sensor_index: Some(SensorId::new(id)),
            name: Some(format!("Sensor {id}")),
            last_seen: Some(1717243200),
            latitude: Some(37.77),
            longitude: Some(-122.42),
            pm2_5_atm: Some(pm2_5),
            humidity: Some(45.0),
            ..Default::default()
        })
    }

    fn orchestrator(
        dir: &TempDir,
        readings: Vec<RawReading>,
        telemetry: Arc<dyn TelemetryClient>,
    ) -> ExportOrchestrator {
        let mut config = LavendairConfig::default();
        config.export.output_dir = dir.path().to_string_lossy().to_string();
        config.export.calibration_overrides.insert("2".to_string(), 2.0);

        ExportOrchestrator::new(
            Arc::new(StaticReadingSource::new(readings)),
            telemetry,
            ExportHistoryLedger::new(Arc::new(MemoryStore::new()), 5),
            OrchestratorSettings::from_config(&config),
        )
    }

    #[tokio::test]
    async fn test_csv_download_completes() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 12.3)], Arc::new(RecordingTelemetry::ok()));

        let job = orchestrator
            .execute(ExportRequest::new([SensorId::new(1)], "csv", "download"))
            .await;

        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.record_count, Some(1));
        assert!(job.error.is_none());

        let path = PathBuf::from(job.output_path.clone().unwrap());
        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(job.output_size, Some(body.len()));
        assert!(body.lines().nth(1).unwrap().contains("\"12.3\""));

        let history = orchestrator.ledger().list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].destination, "CSV Download");
        assert_eq!(history[0].status, HistoryStatus::Success);
        assert_eq!(history[0].records_exported, 1);
    }

    #[tokio::test]
    async fn test_calibration_precedence() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(
            &dir,
            vec![raw(1, 10.0), raw(2, 10.0), raw(3, 10.0)],
            Arc::new(RecordingTelemetry::ok()),
        );

        let mut request = ExportRequest::new(
            [SensorId::new(1), SensorId::new(2), SensorId::new(3)],
            "json",
            "download",
        );
        request.sensors[2].calibration_factor = Some(0.5);

        let job = orchestrator.execute(request).await;
        let body = std::fs::read_to_string(job.output_path.unwrap()).unwrap();
        let readings: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();

        // default, config override, request override
        assert_eq!(readings[0]["measurements"]["pm2_5"], 10.0);
        assert_eq!(readings[1]["measurements"]["pm2_5"], 20.0);
        assert_eq!(readings[2]["measurements"]["pm2_5"], 5.0);
    }

    #[tokio::test]
    async fn test_unsupported_destination_fails_job() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0)], Arc::new(RecordingTelemetry::ok()));

        let job = orchestrator
            .execute(ExportRequest::new([SensorId::new(1)], "csv", "ftp"))
            .await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("Unsupported destination: ftp"));

        let history = orchestrator.ledger().list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].destination, "ftp");
        assert_eq!(history[0].status, HistoryStatus::Failed);
    }

    #[tokio::test]
    async fn test_telemetry_delivery_stores_acknowledgement() {
        let dir = TempDir::new().unwrap();
        let telemetry = Arc::new(RecordingTelemetry::ok());
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0), raw(2, 6.0)], telemetry.clone());

        let request = ExportRequest::new([SensorId::new(1), SensorId::new(2)], "json", "telemetry-platform")
            .with_credentials(crate::core::export::ExportCredentials {
                eagleio_api_key: Some(secret_string("k".to_string())),
                ..Default::default()
            });
        let job = orchestrator.execute(request).await;

        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.record_count, Some(2));
        assert_eq!(job.acknowledgement.as_ref().unwrap()["status"], "ok");
        assert!(job.output_path.is_none());

        let bodies = telemetry.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("\"nodeId\""));
    }

    #[tokio::test]
    async fn test_delivery_failure_records_one_failed_entry() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(
            &dir,
            vec![raw(1, 5.0)],
            Arc::new(RecordingTelemetry::failing("Invalid API key")),
        );

        let request = ExportRequest::new([SensorId::new(1)], "csv", "eagle_io").with_credentials(
            crate::core::export::ExportCredentials {
                eagleio_api_key: Some(secret_string("bad".to_string())),
                ..Default::default()
            },
        );
        let job = orchestrator.execute(request).await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("Delivery failed: Invalid API key"));

        let history = orchestrator.ledger().list().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].destination, "Eagle.io");
        assert_eq!(history[0].records_exported, 0);
        assert_eq!(history[0].error.as_deref(), Some("Delivery failed: Invalid API key"));
    }

    #[tokio::test]
    async fn test_missing_eagleio_key_fails() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0)], Arc::new(RecordingTelemetry::ok()));

        let job = orchestrator
            .execute(ExportRequest::new([SensorId::new(1)], "csv", "eagle_io"))
            .await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error.unwrap().contains("Eagle.io API key not set"));
    }

    #[tokio::test]
    async fn test_empty_selection_fails_job() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0)], Arc::new(RecordingTelemetry::ok()));

        let job = orchestrator
            .execute(ExportRequest::new(Vec::<SensorId>::new(), "csv", "download"))
            .await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error.unwrap().contains("No sensors selected"));
        assert_eq!(orchestrator.ledger().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_calibration_fails_job() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0)], Arc::new(RecordingTelemetry::ok()));

        let job = orchestrator
            .execute(ExportRequest::new([SensorId::new(1)], "csv", "download").with_calibration(f64::NAN))
            .await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error.unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn test_aqs_writes_submission_file() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 9.0)], Arc::new(RecordingTelemetry::ok()));

        let mut request = ExportRequest::new([SensorId::new(1)], "json", "regulatory");
        request.site_number = Some("0042".to_string());
        let job = orchestrator.execute(request).await;

        assert_eq!(job.status(), JobStatus::Completed);
        let path = job.output_path.unwrap();
        assert!(path.contains("AQS_Export_LAVENDAIR_"));
        let xml = std::fs::read_to_string(path).unwrap();
        assert!(xml.contains("<SiteNumber>0042</SiteNumber>"));
        assert_eq!(xml.matches("<Record>").count(), 1);
    }

    #[tokio::test]
    async fn test_run_export_returns_queued_job() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, vec![raw(1, 5.0)], Arc::new(RecordingTelemetry::ok()));

        let ticket = orchestrator.run_export(
            ExportRequest::new([SensorId::new(1)], "csv", "download").with_name("Morning"),
        );
        assert_eq!(ticket.job.status(), JobStatus::Queued);
        assert_eq!(ticket.job.name, "Morning");
        assert_eq!(ticket.job.job_type, JobType::Manual);

        let mut updates = ticket.updates.clone();
        let job = ticket.wait().await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(updates.borrow_and_update().status(), JobStatus::Completed);
    }

    #[test]
    fn test_checked_file_name() {
        assert_eq!(checked_file_name("report.csv").unwrap(), "report.csv");
        assert!(checked_file_name("../report.csv").is_err());
        assert!(checked_file_name("a/b.csv").is_err());
        assert!(checked_file_name("  ").is_err());
        assert!(checked_file_name("..").is_err());
    }
}
