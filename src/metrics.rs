//! Prometheus metrics for the HTTP layer and the ETL pipeline

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,

    // HTTP
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,

    // ETL jobs
    pub etl_jobs_submitted_total: IntCounter,
    pub etl_jobs_completed_total: IntCounter,
    pub etl_jobs_failed_total: IntCounter,
    pub etl_jobs_active: IntGauge,
    pub etl_job_duration_seconds: Histogram,

    // Analysis requests
    pub analysis_requests_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests received")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;

        let etl_jobs_submitted_total =
            IntCounter::new("etl_jobs_submitted_total", "ETL jobs submitted for execution")?;
        let etl_jobs_completed_total =
            IntCounter::new("etl_jobs_completed_total", "ETL jobs that reached completed")?;
        let etl_jobs_failed_total =
            IntCounter::new("etl_jobs_failed_total", "ETL jobs that reached failed")?;
        let etl_jobs_active = IntGauge::new("etl_jobs_active", "ETL jobs currently executing")?;
        let etl_job_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "etl_job_duration_seconds",
            "ETL job execution time in seconds",
        ))?;

        let analysis_requests_total =
            IntCounter::new("analysis_requests_total", "Analysis invocations requested")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(etl_jobs_submitted_total.clone()))?;
        registry.register(Box::new(etl_jobs_completed_total.clone()))?;
        registry.register(Box::new(etl_jobs_failed_total.clone()))?;
        registry.register(Box::new(etl_jobs_active.clone()))?;
        registry.register(Box::new(etl_job_duration_seconds.clone()))?;
        registry.register(Box::new(analysis_requests_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            etl_jobs_submitted_total,
            etl_jobs_completed_total,
            etl_jobs_failed_total,
            etl_jobs_active,
            etl_job_duration_seconds,
            analysis_requests_total,
        })
    }

    /// Export all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics not valid UTF-8: {}", e)))
    }
}
