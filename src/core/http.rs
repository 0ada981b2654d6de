//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::bridge::{AnalyticsBridge, Capability, ProcessBridge};
use crate::error::ApiError;
use crate::ingest;
use crate::jobs::{JobContext, JobOrchestrator, RunEtlRequest, ScheduleEtlRequest};
use crate::metrics::Metrics;
use crate::models::AnalysisKind;
use crate::store::MemStore;

/// Reference series shown on the market overview.
const OVERVIEW_SYMBOLS: [&str; 5] = ["GDP", "UNRATE", "CPIAUCSL", "DGS10", "SP500"];

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemStore>,
    pub bridge: Arc<dyn AnalyticsBridge + Send + Sync>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

fn success<T: Serialize>(data: T) -> Result<Json<Value>, ApiError> {
    let data = serde_json::to_value(data).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(json!({ "success": true, "data": data })))
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "macropulse-etl-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

// Market data endpoints

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    frequency: Option<String>,
}

/// List all known indicators
async fn list_indicators(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let indicators = state.store.get_indicators().await;
    success(indicators)
}

/// Fetch one indicator's series data through the provider capability
async fn get_indicator(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<Value>, ApiError> {
    let indicator = state
        .store
        .get_indicator_by_symbol(&symbol)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Indicator with symbol {} not found", symbol)))?;

    let mut argv = vec![
        "get_series".to_string(),
        "--series_id".to_string(),
        symbol.clone(),
    ];
    if let Some(start) = &params.start_date {
        argv.push("--start_date".to_string());
        argv.push(start.clone());
    }
    if let Some(end) = &params.end_date {
        argv.push("--end_date".to_string());
        argv.push(end.clone());
    }
    if let Some(frequency) = &params.frequency {
        argv.push("--frequency".to_string());
        argv.push(frequency.clone());
    }

    let data = state.bridge.invoke(Capability::SeriesApi, &argv).await?;

    let values: Vec<Value> = data
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let date = row.get("date")?.as_str()?;
                    let value: f64 = match row.get("value")? {
                        Value::String(s) => s.parse().ok()?,
                        Value::Number(n) => n.as_f64()?,
                        _ => return None,
                    };
                    Some(json!({ "date": date, "value": value }))
                })
                .collect()
        })
        .unwrap_or_default();

    success(json!({
        "indicator": symbol,
        "frequency": indicator.frequency,
        "unit": indicator.units,
        "values": values,
        "metadata": {
            "source": indicator.source,
            "last_updated": indicator.last_updated,
            "notes": indicator.description,
        }
    }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: String,
    limit: Option<u32>,
}

/// Search the provider for matching series
async fn search_indicators(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    if params.query.trim().is_empty() {
        return Err(ApiError::Validation(
            "Search query parameter is required".to_string(),
        ));
    }

    let argv = vec![
        "search".to_string(),
        "--search_text".to_string(),
        params.query.clone(),
        "--limit".to_string(),
        params.limit.unwrap_or(10).to_string(),
    ];
    let results = state.bridge.invoke(Capability::SeriesApi, &argv).await?;
    success(results)
}

/// Latest value and percent change for the reference series.
/// A series that fails to fetch is skipped rather than failing the whole
/// overview.
async fn market_overview(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut overview = serde_json::Map::new();

    for symbol in OVERVIEW_SYMBOLS {
        let argv = vec![
            "get_series".to_string(),
            "--series_id".to_string(),
            symbol.to_string(),
        ];
        let data = match state.bridge.invoke(Capability::SeriesApi, &argv).await {
            Ok(data) => data,
            Err(e) => {
                warn!(symbol = symbol, error = %e, "Overview: failed to fetch {}", symbol);
                continue;
            }
        };

        let mut rows: Vec<(chrono::DateTime<chrono::Utc>, String, f64)> = data
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let date_raw = row.get("date")?.as_str()?;
                        let date = crate::models::parse_timestamp(date_raw)?;
                        let value: f64 = match row.get("value")? {
                            Value::String(s) => s.parse().ok()?,
                            Value::Number(n) => n.as_f64()?,
                            _ => return None,
                        };
                        Some((date, date_raw.to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if rows.is_empty() {
            continue;
        }
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        let (_, latest_date, latest_value) = &rows[0];
        let percent_change = rows
            .get(1)
            .map(|(_, _, previous)| {
                if *previous != 0.0 {
                    (latest_value - previous) / previous * 100.0
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        overview.insert(
            symbol.to_string(),
            json!({
                "value": latest_value,
                "date": latest_date,
                "percentChange": (percent_change * 100.0).round() / 100.0,
            }),
        );
    }

    success(Value::Object(overview))
}

// ETL endpoints

#[derive(Debug, Deserialize)]
struct JobsQuery {
    limit: Option<usize>,
}

/// ETL job history, newest first
async fn list_etl_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobsQuery>,
) -> Result<Json<Value>, ApiError> {
    let jobs = state.store.get_etl_jobs(params.limit).await;
    success(jobs)
}

/// One ETL job by id
async fn get_etl_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let job = state
        .store
        .get_etl_job(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("ETL job with ID {} not found", id)))?;
    success(job)
}

/// Submit a job for immediate execution; returns without waiting on the
/// external process
async fn run_etl_job(
    State(state): State<AppState>,
    Json(request): Json<RunEtlRequest>,
) -> Result<Json<Value>, ApiError> {
    let job_id = state.orchestrator.submit(request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "ETL job started",
        "data": { "job_id": job_id }
    })))
}

/// Record a job for a future scheduled time
async fn schedule_etl_job(
    State(state): State<AppState>,
    Json(request): Json<ScheduleEtlRequest>,
) -> Result<Json<Value>, ApiError> {
    let job_id = state.orchestrator.schedule(request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "ETL job scheduled",
        "data": { "job_id": job_id }
    })))
}

/// Aggregate pipeline status over the recent job window
async fn pipeline_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let status = state.orchestrator.status().await;
    success(status)
}

// Analysis endpoints

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    series: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    model: Option<String>,
    periods: Option<u32>,
    window: Option<u32>,
}

impl AnalysisQuery {
    fn series_list(&self) -> Result<Vec<String>, ApiError> {
        let series = self
            .series
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::Validation(
                    "series parameter is required (comma-separated list of series IDs)".to_string(),
                )
            })?;
        Ok(series.split(',').map(|s| s.trim().to_string()).collect())
    }

    fn push_date_range(&self, argv: &mut Vec<String>) {
        if let Some(start) = &self.start_date {
            argv.push("--start_date".to_string());
            argv.push(start.clone());
        }
        if let Some(end) = &self.end_date {
            argv.push("--end_date".to_string());
            argv.push(end.clone());
        }
    }
}

async fn run_analysis(
    state: &AppState,
    kind: AnalysisKind,
    indicators: Vec<String>,
    parameters: Value,
    argv: Vec<String>,
) -> Result<Json<Value>, ApiError> {
    state.metrics.analysis_requests_total.inc();

    let output = state.bridge.invoke(Capability::Analysis, &argv).await?;
    ingest::ingest_analysis_output(&state.store, kind, indicators, parameters, &output).await;

    success(output)
}

/// Correlation matrix between indicators
async fn correlation_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let series_ids = params.series_list()?;
    let series = series_ids.join(",");

    let mut argv = vec![
        "correlation".to_string(),
        "--series".to_string(),
        series,
    ];
    params.push_date_range(&mut argv);

    let parameters = json!({
        "start_date": params.start_date,
        "end_date": params.end_date,
    });
    run_analysis(&state, AnalysisKind::Correlation, series_ids, parameters, argv).await
}

/// Time-series forecast for the first requested series
async fn forecast_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let series_ids = params.series_list()?;
    let series_id = series_ids[0].clone();
    let model = params.model.clone().unwrap_or_else(|| "arima".to_string());
    let periods = params.periods.unwrap_or(10);

    let mut argv = vec![
        "forecast".to_string(),
        "--series".to_string(),
        series_id.clone(),
        "--model".to_string(),
        model.clone(),
        "--periods".to_string(),
        periods.to_string(),
    ];
    params.push_date_range(&mut argv);

    let parameters = json!({
        "start_date": params.start_date,
        "end_date": params.end_date,
        "model": model,
        "periods": periods,
    });
    run_analysis(
        &state,
        AnalysisKind::Forecast,
        vec![series_id],
        parameters,
        argv,
    )
    .await
}

/// Moving averages for the first requested series
async fn moving_averages_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let series_ids = params.series_list()?;
    let series_id = series_ids[0].clone();

    let mut argv = vec![
        "moving_averages".to_string(),
        "--series".to_string(),
        series_id.clone(),
    ];
    params.push_date_range(&mut argv);

    let parameters = json!({
        "start_date": params.start_date,
        "end_date": params.end_date,
    });
    run_analysis(
        &state,
        AnalysisKind::MovingAverages,
        vec![series_id],
        parameters,
        argv,
    )
    .await
}

/// Rolling volatility for the first requested series
async fn volatility_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<Value>, ApiError> {
    let series_ids = params.series_list()?;
    let series_id = series_ids[0].clone();
    let window = params.window.unwrap_or(30);

    let mut argv = vec![
        "volatility".to_string(),
        "--series".to_string(),
        series_id.clone(),
        "--window".to_string(),
        window.to_string(),
    ];
    params.push_date_range(&mut argv);

    let parameters = json!({
        "start_date": params.start_date,
        "end_date": params.end_date,
        "window": window,
    });
    run_analysis(
        &state,
        AnalysisKind::Volatility,
        vec![series_id],
        parameters,
        argv,
    )
    .await
}

#[derive(Debug, Deserialize)]
struct ResultsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Stored analysis results, newest first; an unrecognized type filter
/// matches nothing
async fn list_analysis_results(
    State(state): State<AppState>,
    Query(params): Query<ResultsQuery>,
) -> Result<Json<Value>, ApiError> {
    let results = match params.kind.as_deref() {
        None => state.store.get_analysis_results(None).await,
        Some(raw) => match raw.parse::<AnalysisKind>() {
            Ok(kind) => state.store.get_analysis_results(Some(kind)).await,
            Err(()) => Vec::new(),
        },
    };
    success(results)
}

/// One stored analysis result by id
async fn get_analysis_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .store
        .get_analysis_result(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Analysis result with ID {} not found", id)))?;
    success(result)
}

// System status

/// System aggregate: pipeline state plus API and storage blocks
async fn system_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pipeline = state.orchestrator.status().await;
    let indicators = state.store.get_indicators().await;
    let jobs = state.store.get_etl_jobs(None).await;

    let api_status = if indicators.is_empty() {
        "disconnected"
    } else {
        "connected"
    };

    success(json!({
        "pipeline": {
            "status": pipeline.status,
            "lastRun": pipeline.last_run,
        },
        "api": {
            "status": api_status,
            "callCount": state.metrics.http_requests_total.get(),
        },
        "storage": {
            "status": "healthy",
            "indicators": indicators.len(),
            "jobs": jobs.len(),
        }
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/market/indicators", get(list_indicators))
        .route("/api/market/indicators/{symbol}", get(get_indicator))
        .route("/api/market/search", get(search_indicators))
        .route("/api/market/overview", get(market_overview))
        .route("/api/etl/jobs", get(list_etl_jobs))
        .route("/api/etl/jobs/{id}", get(get_etl_job))
        .route("/api/etl/run", post(run_etl_job))
        .route("/api/etl/schedule", post(schedule_etl_job))
        .route("/api/etl/status", get(pipeline_status))
        .route("/api/analysis/correlation", get(correlation_analysis))
        .route("/api/analysis/forecast", get(forecast_analysis))
        .route("/api/analysis/moving-averages", get(moving_averages_analysis))
        .route("/api/analysis/volatility", get(volatility_analysis))
        .route("/api/analysis/results", get(list_analysis_results))
        .route("/api/analysis/results/{id}", get(get_analysis_result))
        .route("/api/status", get(system_status))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(Metrics::new()?);
    let start_time = Arc::new(Instant::now());

    let store = Arc::new(MemStore::with_sample_data().await);
    let bridge: Arc<dyn AnalyticsBridge + Send + Sync> = Arc::new(ProcessBridge::from_env());
    let job_context = Arc::new(JobContext::new(
        store.clone(),
        bridge.clone(),
        Some(metrics.clone()),
    ));
    let orchestrator = Arc::new(JobOrchestrator::new(job_context));

    let state = AppState {
        store,
        bridge,
        orchestrator,
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: start_time.clone(),
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
