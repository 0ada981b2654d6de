//! Job orchestrator: creates ETL job records, drives their state machine,
//! and runs the external pipeline without blocking the submitter.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bridge::Capability;
use crate::error::ApiError;
use crate::ingest;
use crate::jobs::context::JobContext;
use crate::jobs::types::{
    JobCounts, PipelineState, PipelineStatus, RunEtlRequest, ScheduleEtlRequest,
};
use crate::models::{parse_timestamp, EtlJobUpdate, JobStatus, NewEtlJob};

/// How many recent jobs the status aggregate considers.
pub const STATUS_WINDOW: usize = 5;

pub struct JobOrchestrator {
    ctx: Arc<JobContext>,
}

impl JobOrchestrator {
    pub fn new(ctx: Arc<JobContext>) -> Self {
        Self { ctx }
    }

    /// Create an `in_progress` job and start executing it in the
    /// background. Returns the new job's id immediately; the caller never
    /// waits on the external process.
    pub async fn submit(&self, request: RunEtlRequest) -> Result<i64, ApiError> {
        if request.series_id.trim().is_empty() {
            return Err(ApiError::Validation("series_id is required".to_string()));
        }

        let job = self
            .ctx
            .store
            .create_etl_job(NewEtlJob {
                task: format!("{} Dataset Update", request.series_id),
                status: JobStatus::InProgress,
                start_time: Some(Utc::now()),
                end_time: None,
                records_processed: None,
                error: None,
                metadata: Some(json!({
                    "series_id": request.series_id,
                    "start_date": request.start_date,
                    "end_date": request.end_date,
                })),
            })
            .await;

        if let Some(metrics) = &self.ctx.metrics {
            metrics.etl_jobs_submitted_total.inc();
        }
        info!(
            job_id = job.id,
            series = %request.series_id,
            "Orchestrator: submitted ETL job {} for {}",
            job.id,
            request.series_id
        );

        let ctx = self.ctx.clone();
        let job_id = job.id;
        let _handle: JoinHandle<()> = tokio::spawn(async move {
            Self::execute(ctx, job_id, request).await;
        });

        Ok(job_id)
    }

    /// Record a job for a future time. The promotion of `scheduled` jobs
    /// to `in_progress` belongs to an external scheduler.
    pub async fn schedule(&self, request: ScheduleEtlRequest) -> Result<i64, ApiError> {
        let scheduled_time = parse_timestamp(&request.scheduled_time).ok_or_else(|| {
            ApiError::Validation(format!(
                "invalid date format for scheduled_time: {}",
                request.scheduled_time
            ))
        })?;

        let job = self
            .ctx
            .store
            .create_etl_job(NewEtlJob {
                task: request.task,
                status: JobStatus::Scheduled,
                start_time: Some(scheduled_time),
                end_time: None,
                records_processed: None,
                error: None,
                metadata: Some(json!({
                    "series_id": request.series_id,
                    "start_date": request.start_date,
                    "end_date": request.end_date,
                })),
            })
            .await;

        info!(
            job_id = job.id,
            series = %request.series_id,
            scheduled_time = %scheduled_time,
            "Orchestrator: scheduled ETL job {} for {}",
            job.id,
            scheduled_time
        );

        Ok(job.id)
    }

    /// Run one submitted job to a terminal state.
    ///
    /// Every failure path ends in a `failed` update with `endTime` and an
    /// error message; nothing escapes the spawned task.
    async fn execute(ctx: Arc<JobContext>, job_id: i64, request: RunEtlRequest) {
        let started = Instant::now();
        if let Some(metrics) = &ctx.metrics {
            metrics.etl_jobs_active.inc();
        }

        let outcome = Self::run_pipeline(&ctx, &request).await;

        match outcome {
            Ok((records, output)) => {
                ctx.store
                    .update_etl_job(
                        job_id,
                        EtlJobUpdate {
                            status: Some(JobStatus::Completed),
                            end_time: Some(Utc::now()),
                            records_processed: Some(records),
                            metadata: Some(output),
                            ..Default::default()
                        },
                    )
                    .await;
                if let Some(metrics) = &ctx.metrics {
                    metrics.etl_jobs_completed_total.inc();
                }
                info!(
                    job_id = job_id,
                    records = records,
                    "Orchestrator: ETL job {} completed with {} records",
                    job_id,
                    records
                );
            }
            Err(message) => {
                ctx.store
                    .update_etl_job(
                        job_id,
                        EtlJobUpdate {
                            status: Some(JobStatus::Failed),
                            end_time: Some(Utc::now()),
                            error: Some(message.clone()),
                            ..Default::default()
                        },
                    )
                    .await;
                if let Some(metrics) = &ctx.metrics {
                    metrics.etl_jobs_failed_total.inc();
                }
                error!(
                    job_id = job_id,
                    error = %message,
                    "Orchestrator: ETL job {} failed: {}",
                    job_id,
                    message
                );
            }
        }

        if let Some(metrics) = &ctx.metrics {
            metrics
                .etl_job_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            metrics.etl_jobs_active.dec();
        }
    }

    async fn run_pipeline(
        ctx: &Arc<JobContext>,
        request: &RunEtlRequest,
    ) -> Result<(i64, serde_json::Value), String> {
        let output = ctx
            .bridge
            .invoke(Capability::SeriesFetch, &request.to_argv())
            .await
            .map_err(|e| e.to_string())?;

        let records = ingest::ingest_series_output(&ctx.store, &request.series_id, &output).await;
        Ok((records, output))
    }

    /// Aggregate over the most recent jobs: `active` while anything is
    /// `in_progress`, last completed run time, and counts by status.
    pub async fn status(&self) -> PipelineStatus {
        let recent_jobs = self.ctx.store.get_etl_jobs(Some(STATUS_WINDOW)).await;

        let mut job_counts = JobCounts::default();
        for job in &recent_jobs {
            match job.status {
                JobStatus::Completed => job_counts.completed += 1,
                JobStatus::Failed => job_counts.failed += 1,
                JobStatus::InProgress => job_counts.in_progress += 1,
                JobStatus::Scheduled => job_counts.scheduled += 1,
            }
        }

        let status = if job_counts.in_progress > 0 {
            PipelineState::Active
        } else {
            PipelineState::Idle
        };

        let last_run = recent_jobs
            .iter()
            .find(|j| j.status == JobStatus::Completed)
            .and_then(|j| j.end_time);

        PipelineStatus {
            status,
            last_run,
            job_counts,
            recent_jobs,
        }
    }
}
