//! Unit tests for the job orchestrator

use async_trait::async_trait;
use macropulse::bridge::{AnalyticsBridge, BridgeError, Capability};
use macropulse::jobs::{
    JobContext, JobOrchestrator, PipelineState, RunEtlRequest, ScheduleEtlRequest,
};
use macropulse::models::{EtlJob, JobStatus};
use macropulse::store::MemStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Bridge stub returning a canned outcome for every invocation.
struct StubBridge {
    outcome: Result<Value, (i32, String)>,
}

impl StubBridge {
    fn ok(value: Value) -> Self {
        Self { outcome: Ok(value) }
    }

    fn failing(code: i32, stderr: &str) -> Self {
        Self {
            outcome: Err((code, stderr.to_string())),
        }
    }
}

#[async_trait]
impl AnalyticsBridge for StubBridge {
    async fn invoke(
        &self,
        capability: Capability,
        _argv: &[String],
    ) -> Result<Value, BridgeError> {
        match &self.outcome {
            Ok(value) => Ok(value.clone()),
            Err((code, stderr)) => Err(BridgeError::Execution {
                script: capability.script_name(),
                code: *code,
                stderr: stderr.clone(),
            }),
        }
    }
}

fn orchestrator_with(bridge: StubBridge) -> (Arc<MemStore>, JobOrchestrator) {
    let store = Arc::new(MemStore::new());
    let ctx = Arc::new(JobContext::new(store.clone(), Arc::new(bridge), None));
    (store, JobOrchestrator::new(ctx))
}

fn pipeline_output() -> Value {
    json!({
        "indicator": "GDP",
        "metadata": {"name": "Gross Domestic Product", "frequency": "quarterly"},
        "data": [
            {"date": "2024-01-01", "value": 27000.5},
            {"date": "2024-04-01", "value": 27350.2}
        ]
    })
}

async fn wait_for_terminal(store: &MemStore, job_id: i64) -> EtlJob {
    for _ in 0..200 {
        if let Some(job) = store.get_etl_job(job_id).await {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", job_id);
}

fn run_request(series: &str) -> RunEtlRequest {
    RunEtlRequest {
        series_id: series.to_string(),
        start_date: None,
        end_date: None,
    }
}

#[tokio::test]
async fn submit_returns_immediately_with_job_in_progress() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(pipeline_output()));

    let job_id = orchestrator
        .submit(run_request("GDP"))
        .await
        .expect("submission succeeds");

    // The record exists before execution finishes; status is one of the
    // legal states, never an unknown intermediate.
    let job = store.get_etl_job(job_id).await.expect("job persisted");
    assert_eq!(job.task, "GDP Dataset Update");
    assert!(job.start_time.is_some());
    assert!(matches!(
        job.status,
        JobStatus::InProgress | JobStatus::Completed
    ));
}

#[tokio::test]
async fn successful_execution_completes_job_with_record_count() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(pipeline_output()));

    let job_id = orchestrator.submit(run_request("GDP")).await.unwrap();
    let job = wait_for_terminal(&store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.records_processed, Some(2));
    assert!(job.end_time.is_some());
    assert!(job.error.is_none());
    // Raw bridge output is kept on the job
    assert_eq!(job.metadata.as_ref().unwrap()["indicator"], json!("GDP"));

    // Ingestion ran: indicator created from metadata
    assert!(store.get_indicator_by_symbol("GDP").await.is_some());
}

#[tokio::test]
async fn failed_execution_marks_job_failed_and_writes_nothing() {
    let (store, orchestrator) =
        orchestrator_with(StubBridge::failing(2, "FRED API rate limit exceeded"));

    let job_id = orchestrator.submit(run_request("GDP")).await.unwrap();
    let job = wait_for_terminal(&store, job_id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.end_time.is_some());
    let message = job.error.expect("failure reason recorded");
    assert!(message.contains("rate limit"), "stderr text surfaces: {}", message);

    assert!(
        store.get_indicator_by_symbol("GDP").await.is_none(),
        "no indicator is created for a failed run"
    );
    assert!(store.get_analysis_results(None).await.is_empty());
}

#[tokio::test]
async fn submit_rejects_empty_series_id() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(json!({})));

    let err = orchestrator
        .submit(run_request("  "))
        .await
        .expect_err("blank series_id");
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    assert!(store.get_etl_jobs(None).await.is_empty(), "no record created");
}

#[tokio::test]
async fn schedule_rejects_unparsable_time_without_creating_a_job() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(json!({})));

    let err = orchestrator
        .schedule(ScheduleEtlRequest {
            task: "SP500 Update".to_string(),
            scheduled_time: "not-a-date".to_string(),
            series_id: "SP500".to_string(),
            start_date: None,
            end_date: None,
        })
        .await
        .expect_err("invalid scheduled_time");

    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    assert!(store.get_etl_jobs(None).await.is_empty());
}

#[tokio::test]
async fn schedule_creates_scheduled_job_at_requested_time() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(json!({})));

    let job_id = orchestrator
        .schedule(ScheduleEtlRequest {
            task: "SP500 Update".to_string(),
            scheduled_time: "2030-01-01T16:00:00".to_string(),
            series_id: "SP500".to_string(),
            start_date: None,
            end_date: None,
        })
        .await
        .expect("valid scheduled_time");

    let job = store.get_etl_job(job_id).await.expect("job persisted");
    assert_eq!(job.status, JobStatus::Scheduled);
    assert_eq!(
        job.start_time.unwrap().to_rfc3339(),
        "2030-01-01T16:00:00+00:00"
    );
    assert!(job.end_time.is_none());
}

#[tokio::test]
async fn concurrent_submissions_yield_distinct_jobs() {
    let store = Arc::new(MemStore::new());
    let ctx = Arc::new(JobContext::new(
        store.clone(),
        Arc::new(StubBridge::ok(json!({"data": []}))),
        None,
    ));
    let orchestrator = Arc::new(JobOrchestrator::new(ctx));

    let mut handles = Vec::new();
    for i in 0..50 {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            orchestrator
                .submit(run_request(&format!("SERIES{}", i)))
                .await
                .expect("submission succeeds")
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("task panicked"));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);

    for id in &ids {
        wait_for_terminal(&store, *id).await;
    }

    let status = orchestrator.status().await;
    let counts = status.job_counts;
    assert_eq!(
        counts.completed + counts.failed + counts.in_progress + counts.scheduled,
        status.recent_jobs.len(),
        "counts cover exactly the status window"
    );
}

#[tokio::test]
async fn status_reflects_recent_window() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(json!({"data": []})));

    let empty = orchestrator.status().await;
    assert_eq!(empty.status, PipelineState::Idle);
    assert!(empty.last_run.is_none());
    assert!(empty.recent_jobs.is_empty());

    let job_id = orchestrator.submit(run_request("GDP")).await.unwrap();
    let job = wait_for_terminal(&store, job_id).await;

    let status = orchestrator.status().await;
    assert_eq!(status.status, PipelineState::Idle);
    assert_eq!(status.last_run, job.end_time);
    assert_eq!(status.job_counts.completed, 1);
    assert_eq!(status.recent_jobs.len(), 1);
}

#[tokio::test]
async fn terminal_state_is_never_overwritten() {
    let (store, orchestrator) = orchestrator_with(StubBridge::ok(json!({"data": []})));

    let job_id = orchestrator.submit(run_request("GDP")).await.unwrap();
    let first = wait_for_terminal(&store, job_id).await;
    assert_eq!(first.status, JobStatus::Completed);

    // Give any stray completion path time to run again; the terminal
    // state must be stable.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = store.get_etl_job(job_id).await.unwrap();
    assert_eq!(second.status, first.status);
    assert_eq!(second.end_time, first.end_time);
}
