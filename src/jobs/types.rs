//! Request and status types for the ETL job workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::EtlJob;

/// Request to run a series-fetch job immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEtlRequest {
    pub series_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RunEtlRequest {
    /// Argument list handed to the series-fetch capability.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = vec![self.series_id.clone()];
        if let Some(start) = &self.start_date {
            argv.push("--start_date".to_string());
            argv.push(start.clone());
        }
        if let Some(end) = &self.end_date {
            argv.push("--end_date".to_string());
            argv.push(end.clone());
        }
        argv
    }
}

/// Request to record a series-fetch job for a future time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEtlRequest {
    pub task: String,
    pub scheduled_time: String,
    pub series_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Overall pipeline state derived from the recent job window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Active,
    Idle,
}

/// Job counts by status over the recent window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub scheduled: usize,
}

/// Aggregate pipeline status for observability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    pub status: PipelineState,
    pub last_run: Option<DateTime<Utc>>,
    pub job_counts: JobCounts,
    pub recent_jobs: Vec<EtlJob>,
}
