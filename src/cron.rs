//! Host cron-job registration for the morning/evening summary schedule.
//!
//! The host owns the actual scheduler; this module builds the two job specs,
//! hands them across the [`JobScheduler`] boundary, and records the assigned
//! job ids in the config record so they can be removed later.

use serde::Serialize;
use std::process::Command;

use crate::error::CronError;
use crate::store::{ConfigStore, OuraConfig};

/// Stable job ids, one per summary.
pub const MORNING_JOB_ID: &str = "ouralink-morning";
pub const EVENING_JOB_ID: &str = "ouralink-evening";

/// Host CLI invoked by the default scheduler implementation.
pub const DEFAULT_HOST_PROGRAM: &str = "openclaw";

const DEFAULT_MORNING_TIME: &str = "07:00";
const DEFAULT_EVENING_TIME: &str = "21:00";
const DEFAULT_TIMEZONE: &str = "UTC";

/// A scheduled agent-turn job as the host expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobSpec {
    pub id: String,
    /// Five-field cron expression, evaluated in `timezone`.
    pub cron: String,
    pub timezone: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub isolated_session: bool,
    pub message: String,
    pub deliver: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_target: Option<String>,
}

/// Convert a wall-clock `HH:MM` time into a daily cron expression.
pub fn time_to_cron(time: &str) -> Result<String, CronError> {
    let Some((hours, minutes)) = time.split_once(':') else {
        return Err(CronError::InvalidTime(time.to_string()));
    };
    let hours: u8 = hours
        .parse()
        .map_err(|_| CronError::InvalidTime(time.to_string()))?;
    let minutes: u8 = minutes
        .parse()
        .map_err(|_| CronError::InvalidTime(time.to_string()))?;
    if hours > 23 || minutes > 59 {
        return Err(CronError::InvalidTime(time.to_string()));
    }
    Ok(format!("{minutes} {hours} * * *"))
}

/// Build the morning summary job from the stored preferences.
pub fn build_morning_job(config: &OuraConfig) -> Result<CronJobSpec, CronError> {
    let message = "Fetch my Oura Ring data for this morning's summary. \
                   Use the oura_data tool to get daily_sleep, daily_readiness, and daily_stress for today. \
                   Also fetch the detailed sleep periods using the sleep endpoint. \
                   Format the results as a morning health summary.";
    build_job(
        config,
        MORNING_JOB_ID,
        config.morning_time.as_deref().unwrap_or(DEFAULT_MORNING_TIME),
        message,
    )
}

/// Build the evening summary job from the stored preferences.
pub fn build_evening_job(config: &OuraConfig) -> Result<CronJobSpec, CronError> {
    let message = "Fetch my Oura Ring data for this evening's summary. \
                   Use the oura_data tool to get daily_activity, daily_readiness, and daily_stress for today. \
                   Also fetch daily_sleep for a sleep recap. \
                   Format the results as an evening health summary.";
    build_job(
        config,
        EVENING_JOB_ID,
        config.evening_time.as_deref().unwrap_or(DEFAULT_EVENING_TIME),
        message,
    )
}

fn build_job(
    config: &OuraConfig,
    id: &str,
    time: &str,
    message: &str,
) -> Result<CronJobSpec, CronError> {
    let mut job = CronJobSpec {
        id: id.to_string(),
        cron: time_to_cron(time)?,
        timezone: config
            .timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        kind: "agentTurn".to_string(),
        isolated_session: true,
        message: message.to_string(),
        deliver: true,
        channel: None,
        channel_target: None,
    };

    // "default" means the host's active channel at delivery time; only an
    // explicit channel preference is carried into the job.
    if let Some(channel) = config.preferred_channel.as_deref() {
        if channel != "default" {
            job.channel = Some(channel.to_string());
            job.channel_target = config.preferred_channel_target.clone();
        }
    }

    Ok(job)
}

// ---------------------------------------------------------------------------
// Host scheduler boundary
// ---------------------------------------------------------------------------

/// The host collaborator that owns scheduled jobs.
pub trait JobScheduler {
    /// Register (or replace) a job under its id.
    fn register(&self, job: &CronJobSpec) -> Result<(), CronError>;
    /// Remove a previously registered job.
    fn unregister(&self, job_id: &str) -> Result<(), CronError>;
}

/// Scheduler that drives the host's CLI.
pub struct CommandScheduler {
    program: String,
}

impl CommandScheduler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<(), CronError> {
        let output = Command::new(&self.program).args(args).output()?;
        if !output.status.success() {
            return Err(CronError::Host {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_PROGRAM)
    }
}

impl JobScheduler for CommandScheduler {
    fn register(&self, job: &CronJobSpec) -> Result<(), CronError> {
        let payload = serde_json::to_string(job)?;
        self.run(&["cron", "add", "--json", &payload])
    }

    fn unregister(&self, job_id: &str) -> Result<(), CronError> {
        self.run(&["cron", "remove", job_id])
    }
}

// ---------------------------------------------------------------------------
// Create / remove
// ---------------------------------------------------------------------------

/// Register both summary jobs and record their ids.
pub async fn create_jobs(
    store: &ConfigStore,
    scheduler: &dyn JobScheduler,
) -> Result<(), CronError> {
    let config = store.get().await;
    let morning = build_morning_job(&config)?;
    let evening = build_evening_job(&config)?;

    scheduler.register(&morning)?;
    scheduler.register(&evening)?;

    store
        .update(|record| {
            record.morning_cron_job_id = Some(morning.id.clone());
            record.evening_cron_job_id = Some(evening.id.clone());
        })
        .await?;
    tracing::info!("registered morning and evening summary jobs");
    Ok(())
}

/// Unregister any recorded jobs and clear the id fields (only these fields
/// are ever cleared from the record).
pub async fn remove_jobs(
    store: &ConfigStore,
    scheduler: &dyn JobScheduler,
) -> Result<(), CronError> {
    let config = store.get().await;
    if let Some(id) = config.morning_cron_job_id.as_deref() {
        scheduler.unregister(id)?;
    }
    if let Some(id) = config.evening_cron_job_id.as_deref() {
        scheduler.unregister(id)?;
    }
    store
        .update(|record| {
            record.morning_cron_job_id = None;
            record.evening_cron_job_id = None;
        })
        .await?;
    tracing::info!("removed scheduled summary jobs");
    Ok(())
}
