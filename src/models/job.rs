use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// ETL job lifecycle state.
///
/// `scheduled -> in_progress -> {completed, failed}`; both `completed` and
/// `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One tracked unit of orchestrated ETL work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlJob {
    pub id: i64,
    pub task: String,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub records_processed: Option<i64>,
    pub error: Option<String>,
    pub metadata: Option<Value>,
}

/// Id-less insert shape for [`EtlJob`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEtlJob {
    pub task: String,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub records_processed: Option<i64>,
    pub error: Option<String>,
    pub metadata: Option<Value>,
}

/// Partial update for a job; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EtlJobUpdate {
    pub status: Option<JobStatus>,
    pub end_time: Option<DateTime<Utc>>,
    pub records_processed: Option<i64>,
    pub error: Option<String>,
    pub metadata: Option<Value>,
}
