//! Schedule command implementation
//!
//! Schedules are stored definitions only. `schedule run` executes one
//! immediately; nothing in Lavendair triggers them on a timer.

use crate::adapters::store::create_store;
use crate::config::{load_config_or_default, LavendairConfig};
use crate::core::export::{ExportOrchestrator, ExportRequest};
use crate::core::state::ScheduleRegistry;
use crate::domain::schedule::parse_time_of_day;
use crate::domain::{
    CredentialsRef, Destination, ExportFormat, Frequency, JobStatus, ScheduleDefinition,
    ScheduleId, SensorId,
};
use chrono::Utc;
use clap::{Args, Subcommand};

/// Arguments for the schedule command
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub action: ScheduleCommand,
}

/// Schedule actions
#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Create a recurring export definition
    Create(CreateScheduleArgs),

    /// List stored schedules with their next due time
    List,

    /// Delete a schedule (past history is kept)
    Delete {
        /// Schedule id
        id: String,
    },

    /// Run a schedule once, now
    Run {
        /// Schedule id
        id: String,
    },
}

/// Arguments for `schedule create`
#[derive(Args, Debug)]
pub struct CreateScheduleArgs {
    /// Schedule name
    #[arg(short, long)]
    pub name: String,

    /// hourly, daily, weekly or monthly
    #[arg(long, value_parser = clap::value_parser!(Frequency))]
    pub frequency: Frequency,

    /// Time of day (HH:MM, UTC)
    #[arg(long, default_value = "00:00")]
    pub time: String,

    /// Sensor indexes (comma-separated)
    #[arg(short, long)]
    pub sensors: String,

    /// Output format (csv or json)
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Destination (download, eagle_io or aqs)
    #[arg(short, long, default_value = "download")]
    pub destination: String,

    /// Eagle.io API base URL override
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Environment variable holding the Eagle.io API key
    #[arg(long)]
    pub api_key_env: Option<String>,

    /// AQS facility (site) number
    #[arg(long)]
    pub facility_id: Option<String>,

    /// AQS account user name
    #[arg(long)]
    pub username: Option<String>,

    /// Environment variable holding the AQS password
    #[arg(long)]
    pub password_env: Option<String>,
}

impl CreateScheduleArgs {
    fn to_definition(&self) -> Result<ScheduleDefinition, String> {
        let time_of_day = parse_time_of_day(&self.time)?;
        let sensors = SensorId::parse_list(&self.sensors)?;
        let format: ExportFormat = self.format.parse()?;
        let destination: Destination = self.destination.parse().map_err(|e| format!("{e}"))?;

        Ok(ScheduleDefinition::new(
            &self.name,
            self.frequency,
            time_of_day,
            sensors,
            format,
            destination,
            CredentialsRef {
                endpoint: self.endpoint.clone(),
                api_key_env: self.api_key_env.clone(),
                facility_id: self.facility_id.clone(),
                username: self.username.clone(),
                password_env: self.password_env.clone(),
            },
            Utc::now(),
        ))
    }
}

impl ScheduleArgs {
    /// Execute the schedule command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let registry = match create_store(&config.storage).await {
            Ok(store) => ScheduleRegistry::new(store, config.storage.max_write_attempts),
            Err(e) => {
                eprintln!("Failed to open storage: {e}");
                return Ok(5);
            }
        };

        match &self.action {
            ScheduleCommand::Create(args) => create(&registry, args).await,
            ScheduleCommand::List => list(&registry).await,
            ScheduleCommand::Delete { id } => delete(&registry, id).await,
            ScheduleCommand::Run { id } => run(&registry, id, &config).await,
        }
    }
}

async fn create(registry: &ScheduleRegistry, args: &CreateScheduleArgs) -> anyhow::Result<i32> {
    let definition = match args.to_definition() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Invalid schedule: {e}");
            return Ok(2);
        }
    };

    match registry.create(definition).await {
        Ok(created) => {
            println!("✅ Schedule created: {} ({})", created.name, created.id);
            println!(
                "  Next run: {}",
                created.next_run_after(Utc::now()).format("%Y-%m-%d %H:%M UTC")
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("Failed to create schedule: {e}");
            Ok(2)
        }
    }
}

async fn list(registry: &ScheduleRegistry) -> anyhow::Result<i32> {
    let schedules = registry.list().await?;
    if schedules.is_empty() {
        println!("No schedules defined");
        return Ok(0);
    }

    let now = Utc::now();
    println!(
        "{:<36}  {:<20}  {:<8}  {:<5}  {:<12}  {:<7}  NEXT RUN",
        "ID", "NAME", "FREQ", "TIME", "DESTINATION", "STATUS"
    );
    for s in &schedules {
        println!(
            "{:<36}  {:<20}  {:<8}  {}  {:<12}  {:<7}  {}",
            s.id,
            s.name,
            s.frequency,
            s.time_of_day.format("%H:%M"),
            s.destination,
            s.status,
            s.next_run_after(now).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(0)
}

async fn delete(registry: &ScheduleRegistry, id: &str) -> anyhow::Result<i32> {
    let id = match ScheduleId::new(id) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Invalid schedule id: {e}");
            return Ok(2);
        }
    };

    if registry.delete(&id).await? {
        println!("🗑️  Schedule deleted: {id}");
    } else {
        println!("Schedule not found: {id}");
    }
    Ok(0)
}

async fn run(registry: &ScheduleRegistry, id: &str, config: &LavendairConfig) -> anyhow::Result<i32> {
    let schedule = match ScheduleId::new(id) {
        Ok(id) => registry.get(&id).await?,
        Err(_) => None,
    };
    let Some(schedule) = schedule else {
        eprintln!("Schedule not found: {id}");
        return Ok(2);
    };

    let orchestrator = match ExportOrchestrator::from_config(config).await {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Failed to initialize export: {e}");
            return Ok(4);
        }
    };

    println!("🚀 Running schedule {}...", schedule.name);
    let job = orchestrator
        .execute(ExportRequest::from_schedule(&schedule, None, config))
        .await;

    match job.status() {
        JobStatus::Completed => {
            println!(
                "✅ {} records exported",
                job.record_count.unwrap_or_default()
            );
            Ok(0)
        }
        _ => {
            println!(
                "❌ Export failed: {}",
                job.error.as_deref().unwrap_or("unknown error")
            );
            Ok(1)
        }
    }
}
