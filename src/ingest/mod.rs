//! Result ingestion
//!
//! Converts successful bridge output into durable records: analysis
//! snapshots, indicator metadata refresh/creation, and bulk value
//! appends.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{
    parse_timestamp, AnalysisKind, Frequency, IndicatorUpdate, NewAnalysisResult, NewIndicator,
    NewValue,
};
use crate::store::MemStore;

/// External provider name stamped on indicators created from ETL output.
const PROVIDER: &str = "FRED";

/// Ingest the output of a series-fetch pipeline run.
///
/// When the output carries a `metadata` object, the indicator for
/// `series_id` is refreshed (existing) or created (new, with metadata
/// fallbacks). Observation rows from the `data` list are appended as
/// values; rows whose date or value does not parse are skipped. The
/// returned count is the length of the `data` list, 0 when absent.
pub async fn ingest_series_output(store: &MemStore, series_id: &str, output: &Value) -> i64 {
    if let Some(metadata) = output.get("metadata").filter(|m| m.is_object()) {
        upsert_indicator(store, series_id, metadata).await;
    }

    let data = output.get("data").and_then(Value::as_array);
    let records = data.map_or(0, |rows| rows.len() as i64);

    if let Some(rows) = data {
        if let Some(indicator) = store.get_indicator_by_symbol(series_id).await {
            let mut new_values = Vec::new();
            for row in rows {
                match parse_observation(indicator.id, row) {
                    Some(value) => new_values.push(value),
                    None => {
                        debug!(
                            series = series_id,
                            "Ingest: skipping observation row without parsable date/value"
                        );
                    }
                }
            }
            if !new_values.is_empty() {
                let stored = store.bulk_create_values(new_values).await;
                info!(
                    series = series_id,
                    count = stored.len(),
                    "Ingest: appended {} values for {}",
                    stored.len(),
                    series_id
                );
            }
        }
    }

    records
}

async fn upsert_indicator(store: &MemStore, series_id: &str, metadata: &Value) {
    let now = Utc::now();

    if let Some(existing) = store.get_indicator_by_symbol(series_id).await {
        store
            .update_indicator(
                existing.id,
                IndicatorUpdate {
                    last_updated: Some(now),
                    ..Default::default()
                },
            )
            .await;
        debug!(
            series = series_id,
            "Ingest: refreshed lastUpdated for {}", series_id
        );
        return;
    }

    let name = metadata
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(series_id)
        .to_string();
    let description = metadata
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let frequency = metadata
        .get("frequency")
        .and_then(Value::as_str)
        .map_or(Frequency::Unknown, Frequency::parse);
    let units = metadata
        .get("units")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let indicator = store
        .create_indicator(NewIndicator {
            symbol: series_id.to_string(),
            name,
            description: Some(description),
            frequency,
            units: Some(units),
            source: PROVIDER.to_string(),
            last_updated: now,
        })
        .await;
    info!(
        series = series_id,
        indicator_id = indicator.id,
        "Ingest: created indicator {} for {}",
        indicator.id,
        series_id
    );
}

fn parse_observation(indicator_id: i64, row: &Value) -> Option<NewValue> {
    let date = row.get("date").and_then(Value::as_str).and_then(parse_timestamp)?;
    let value = match row.get("value")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(NewValue {
        indicator_id,
        date,
        value,
    })
}

/// Persist an analysis output snapshot.
///
/// Correlation output is persisted unconditionally. Forecast, moving
/// averages, and volatility carry a self-reported `error` field on
/// failure; such outputs are surfaced to the caller but never persisted.
/// Returns whether a result row was written.
pub async fn ingest_analysis_output(
    store: &MemStore,
    kind: AnalysisKind,
    indicators: Vec<String>,
    parameters: Value,
    output: &Value,
) -> bool {
    if kind.reports_inline_error() {
        let has_error = output.get("error").map_or(false, |e| !e.is_null());
        if has_error {
            debug!(
                kind = %kind,
                "Ingest: {} output self-reported an error, not persisting",
                kind
            );
            return false;
        }
    }

    let result = store
        .create_analysis_result(NewAnalysisResult {
            kind,
            indicators,
            parameters,
            results: output.clone(),
            created_at: Utc::now(),
        })
        .await;
    debug!(
        kind = %kind,
        result_id = result.id,
        "Ingest: stored {} analysis result {}",
        kind,
        result.id
    );
    true
}
