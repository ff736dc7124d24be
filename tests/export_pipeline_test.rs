//! End-to-end export tests against mock PurpleAir and Eagle.io servers
//!
//! Each test wires a real orchestrator from configuration: HTTP clients
//! pointed at mockito, a file-backed store and an output directory in a
//! temporary directory.

use lavendair::adapters::store::create_store;
use lavendair::config::{secret_string, LavendairConfig, StorageBackend};
use lavendair::core::export::{ExportCredentials, ExportOrchestrator, ExportRequest};
use lavendair::core::state::ExportHistoryLedger;
use lavendair::domain::{HistoryStatus, JobStatus, JobType, SensorId};
use mockito::{Matcher, Server, ServerGuard};
use tempfile::TempDir;

const SENSOR_BODY: &str = r#"{
    "api_version": "V1.0.11",
    "time_stamp": 1717243200,
    "sensor": {
        "name": "Mission District",
        "last_seen": 1717243140,
        "latitude": 37.76,
        "longitude": -122.42,
        "pm1.0_atm": 8.1,
        "pm2.5_atm": 12.3,
        "pm10.0_atm": 15.0,
        "humidity": 45,
        "temperature": 68,
        "pressure": 1012.5
    }
}"#;

fn config(dir: &TempDir, purpleair: &ServerGuard, eagleio: &ServerGuard) -> LavendairConfig {
    let mut config = LavendairConfig::default();
    config.purpleair.base_url = purpleair.url();
    config.purpleair.api_key = Some(secret_string("read-key".to_string()));
    config.eagleio.api_url = eagleio.url();
    config.eagleio.api_key = Some(secret_string("eagle-key".to_string()));
    config.export.output_dir = dir.path().join("exports").to_string_lossy().to_string();
    config.storage.backend = StorageBackend::File;
    config.storage.path = dir.path().join("state").to_string_lossy().to_string();
    config
}

async fn mock_sensor(server: &mut ServerGuard, id: u64) -> mockito::Mock {
    server
        .mock("GET", format!("/sensors/{id}").as_str())
        .match_header("X-API-Key", "read-key")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SENSOR_BODY)
        .create_async()
        .await
}

async fn reopened_ledger(config: &LavendairConfig) -> ExportHistoryLedger {
    let store = create_store(&config.storage).await.unwrap();
    ExportHistoryLedger::new(store, config.storage.max_write_attempts)
}

#[tokio::test]
async fn test_csv_download_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let eagleio = Server::new_async().await;
    let sensor_mock = mock_sensor(&mut purpleair, 131075).await;

    let config = config(&dir, &purpleair, &eagleio);
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let request = ExportRequest::new([SensorId::new(131075)], "csv", "download")
        .with_credentials(ExportCredentials::from_config(&config));
    let job = orchestrator.execute(request).await;

    sensor_mock.assert_async().await;
    assert_eq!(job.status(), JobStatus::Completed, "error: {:?}", job.error);
    assert_eq!(job.record_count, Some(1));

    let path = job.output_path.clone().unwrap();
    assert!(path.ends_with(".csv"));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(job.output_size, Some(contents.len()));

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("\"Sensor ID\""));
    assert!(lines[1].starts_with("\"131075\","));
    assert!(lines[1].contains("Mission District"));
    assert!(lines[1].contains("12.3"));

    // History survives a fresh store handle
    let records = reopened_ledger(&config).await.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, job.id);
    assert_eq!(records[0].destination, "CSV Download");
    assert_eq!(records[0].job_type, JobType::Manual);
    assert_eq!(records[0].status, HistoryStatus::Success);
    assert_eq!(records[0].records_exported, 1);
}

#[tokio::test]
async fn test_eagleio_rejection_fails_job_with_one_record() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let mut eagleio = Server::new_async().await;
    mock_sensor(&mut purpleair, 7).await;
    let delivery = eagleio
        .mock("POST", "/v1/nodes/data")
        .match_header("authorization", "Bearer eagle-key")
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = config(&dir, &purpleair, &eagleio);
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let request = ExportRequest::new([SensorId::new(7)], "json", "eagle_io")
        .with_credentials(ExportCredentials::from_config(&config));
    let job = orchestrator.execute(request).await;

    delivery.assert_async().await;
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("Delivery failed: Invalid API key"));
    assert!(job.record_count.is_none());

    let records = orchestrator.ledger().list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].destination, "Eagle.io");
    assert_eq!(records[0].status, HistoryStatus::Failed);
    assert_eq!(records[0].records_exported, 0);
    assert_eq!(
        records[0].error.as_deref(),
        Some("Delivery failed: Invalid API key")
    );
}

#[tokio::test]
async fn test_eagleio_acknowledgement_is_kept() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let mut eagleio = Server::new_async().await;
    mock_sensor(&mut purpleair, 7).await;
    eagleio
        .mock("POST", "/v1/nodes/data")
        .with_status(202)
        .with_body(r#"{"accepted":1}"#)
        .create_async()
        .await;

    let config = config(&dir, &purpleair, &eagleio);
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let request = ExportRequest::new([SensorId::new(7)], "json", "eagle_io")
        .with_credentials(ExportCredentials::from_config(&config));
    let job = orchestrator.execute(request).await;

    assert_eq!(job.status(), JobStatus::Completed, "error: {:?}", job.error);
    assert_eq!(job.acknowledgement, Some(serde_json::json!({"accepted": 1})));
    assert!(job.output_path.is_none());
}

#[tokio::test]
async fn test_purpleair_rejection_fails_job() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let eagleio = Server::new_async().await;
    purpleair
        .mock("GET", "/sensors/1")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(
            r#"{"error":"ApiKeyInvalidError","description":"The provided api_key was not valid."}"#,
        )
        .create_async()
        .await;

    let config = config(&dir, &purpleair, &eagleio);
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let request = ExportRequest::new([SensorId::new(1)], "csv", "download")
        .with_credentials(ExportCredentials::from_config(&config));
    let job = orchestrator.execute(request).await;

    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job
        .error
        .as_deref()
        .unwrap()
        .contains("The provided api_key was not valid."));
    assert_eq!(orchestrator.ledger().list().await.unwrap().len(), 1);
    assert!(job.output_path.is_none());
}

#[tokio::test]
async fn test_run_export_reports_progress() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let eagleio = Server::new_async().await;
    mock_sensor(&mut purpleair, 131075).await;

    let config = config(&dir, &purpleair, &eagleio);
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let request = ExportRequest::new([SensorId::new(131075)], "json", "download")
        .with_credentials(ExportCredentials::from_config(&config));
    let ticket = orchestrator.run_export(request);
    assert_eq!(ticket.job.status(), JobStatus::Queued);

    let mut updates = ticket.updates.clone();
    let job = ticket.wait().await.unwrap();
    assert_eq!(job.status(), JobStatus::Completed, "error: {:?}", job.error);

    // The watch channel holds the terminal snapshot once the task is done
    assert!(updates.borrow_and_update().status().is_terminal());
    assert_eq!(orchestrator.ledger().summary().await.unwrap().successful, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exports_each_leave_one_record() {
    let dir = TempDir::new().unwrap();
    let mut purpleair = Server::new_async().await;
    let eagleio = Server::new_async().await;
    mock_sensor(&mut purpleair, 131075).await;

    let config = config(&dir, &purpleair, &eagleio);
    let jobs = config.storage.max_write_attempts * 8;
    let orchestrator = ExportOrchestrator::from_config(&config).await.unwrap();

    let tickets: Vec<_> = (0..jobs)
        .map(|i| {
            let request = ExportRequest::new([SensorId::new(131075)], "json", "download")
                .with_credentials(ExportCredentials::from_config(&config))
                .with_file_name(format!("concurrent-{i}.json"));
            orchestrator.run_export(request)
        })
        .collect();
    for ticket in tickets {
        let job = ticket.wait().await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed, "error: {:?}", job.error);
    }

    let records = reopened_ledger(&config).await.list().await.unwrap();
    assert_eq!(records.len(), jobs);
    let summary = orchestrator.ledger().summary().await.unwrap();
    assert_eq!(summary.successful, jobs);
}
