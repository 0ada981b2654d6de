//! In-memory entity store
//!
//! Authoritative collection of the four entity kinds with per-kind
//! monotonically increasing identifiers. A single instance is built at
//! startup and shared as `Arc<MemStore>`; all reads return owned
//! snapshots, so a listing is unaffected by later writes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{
    AnalysisKind, AnalysisResult, EtlJob, EtlJobUpdate, Frequency, Indicator, IndicatorUpdate,
    IndicatorValue, NewAnalysisResult, NewEtlJob, NewIndicator, NewValue,
};

#[derive(Default)]
struct Inner {
    indicators: HashMap<i64, Indicator>,
    values: HashMap<i64, IndicatorValue>,
    etl_jobs: HashMap<i64, EtlJob>,
    analysis_results: HashMap<i64, AnalysisResult>,

    // Per-kind id sequences; ids start at 1 and are never reused.
    indicator_seq: i64,
    value_seq: i64,
    etl_job_seq: i64,
    analysis_result_seq: i64,
}

pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Store pre-seeded with the reference indicator catalog.
    pub async fn with_sample_data() -> Self {
        let store = Self::new();

        let samples = [
            (
                "GDP",
                "Gross Domestic Product",
                "Real Gross Domestic Product",
                Frequency::Quarterly,
                "Billions of Dollars",
            ),
            (
                "UNRATE",
                "Unemployment Rate",
                "Civilian Unemployment Rate",
                Frequency::Monthly,
                "Percent",
            ),
            (
                "CPIAUCSL",
                "Consumer Price Index",
                "Consumer Price Index for All Urban Consumers: All Items",
                Frequency::Monthly,
                "Index 1982-1984=100",
            ),
            (
                "DGS10",
                "10-Year Treasury Rate",
                "10-Year Treasury Constant Maturity Rate",
                Frequency::Daily,
                "Percent",
            ),
            (
                "SP500",
                "S&P 500",
                "S&P 500 Stock Market Index",
                Frequency::Daily,
                "Index",
            ),
        ];

        for (symbol, name, description, frequency, units) in samples {
            store
                .create_indicator(NewIndicator {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    frequency,
                    units: Some(units.to_string()),
                    source: "FRED".to_string(),
                    last_updated: Utc::now(),
                })
                .await;
        }

        store
    }

    // Indicators

    pub async fn get_indicators(&self) -> Vec<Indicator> {
        let inner = self.inner.read().await;
        let mut indicators: Vec<Indicator> = inner.indicators.values().cloned().collect();
        indicators.sort_by_key(|i| i.id);
        indicators
    }

    pub async fn get_indicator(&self, id: i64) -> Option<Indicator> {
        let inner = self.inner.read().await;
        inner.indicators.get(&id).cloned()
    }

    pub async fn get_indicator_by_symbol(&self, symbol: &str) -> Option<Indicator> {
        let inner = self.inner.read().await;
        inner
            .indicators
            .values()
            .find(|i| i.symbol == symbol)
            .cloned()
    }

    pub async fn create_indicator(&self, new: NewIndicator) -> Indicator {
        let mut inner = self.inner.write().await;
        inner.indicator_seq += 1;
        let indicator = Indicator {
            id: inner.indicator_seq,
            symbol: new.symbol,
            name: new.name,
            description: new.description,
            frequency: new.frequency,
            units: new.units,
            source: new.source,
            last_updated: new.last_updated,
        };
        inner.indicators.insert(indicator.id, indicator.clone());
        indicator
    }

    pub async fn update_indicator(&self, id: i64, update: IndicatorUpdate) -> Option<Indicator> {
        let mut inner = self.inner.write().await;
        let indicator = inner.indicators.get_mut(&id)?;
        if let Some(name) = update.name {
            indicator.name = name;
        }
        if let Some(description) = update.description {
            indicator.description = Some(description);
        }
        if let Some(frequency) = update.frequency {
            indicator.frequency = frequency;
        }
        if let Some(units) = update.units {
            indicator.units = Some(units);
        }
        if let Some(last_updated) = update.last_updated {
            indicator.last_updated = last_updated;
        }
        Some(indicator.clone())
    }

    // Values

    /// Observations for one indicator, ascending by date. Bounds are
    /// inclusive; values strictly outside them are excluded.
    pub async fn get_values(
        &self,
        indicator_id: i64,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Vec<IndicatorValue> {
        let inner = self.inner.read().await;
        let mut values: Vec<IndicatorValue> = inner
            .values
            .values()
            .filter(|v| v.indicator_id == indicator_id)
            .filter(|v| start_date.map_or(true, |start| v.date >= start))
            .filter(|v| end_date.map_or(true, |end| v.date <= end))
            .cloned()
            .collect();
        values.sort_by_key(|v| v.date);
        values
    }

    pub async fn create_value(&self, new: NewValue) -> IndicatorValue {
        let mut inner = self.inner.write().await;
        Self::insert_value(&mut inner, new)
    }

    pub async fn bulk_create_values(&self, new_values: Vec<NewValue>) -> Vec<IndicatorValue> {
        let mut inner = self.inner.write().await;
        new_values
            .into_iter()
            .map(|new| Self::insert_value(&mut inner, new))
            .collect()
    }

    fn insert_value(inner: &mut Inner, new: NewValue) -> IndicatorValue {
        inner.value_seq += 1;
        let value = IndicatorValue {
            id: inner.value_seq,
            indicator_id: new.indicator_id,
            date: new.date,
            value: new.value,
        };
        inner.values.insert(value.id, value.clone());
        value
    }

    // ETL jobs

    /// Job history, newest start time first; jobs without a start time
    /// sort last.
    pub async fn get_etl_jobs(&self, limit: Option<usize>) -> Vec<EtlJob> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<EtlJob> = inner.etl_jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        if let Some(limit) = limit {
            jobs.truncate(limit);
        }
        jobs
    }

    pub async fn get_etl_job(&self, id: i64) -> Option<EtlJob> {
        let inner = self.inner.read().await;
        inner.etl_jobs.get(&id).cloned()
    }

    pub async fn create_etl_job(&self, new: NewEtlJob) -> EtlJob {
        let mut inner = self.inner.write().await;
        inner.etl_job_seq += 1;
        let job = EtlJob {
            id: inner.etl_job_seq,
            task: new.task,
            status: new.status,
            start_time: new.start_time,
            end_time: new.end_time,
            records_processed: new.records_processed,
            error: new.error,
            metadata: new.metadata,
        };
        inner.etl_jobs.insert(job.id, job.clone());
        job
    }

    pub async fn update_etl_job(&self, id: i64, update: EtlJobUpdate) -> Option<EtlJob> {
        let mut inner = self.inner.write().await;
        let job = inner.etl_jobs.get_mut(&id)?;
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(end_time) = update.end_time {
            job.end_time = Some(end_time);
        }
        if let Some(records_processed) = update.records_processed {
            job.records_processed = Some(records_processed);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
        if let Some(metadata) = update.metadata {
            job.metadata = Some(metadata);
        }
        Some(job.clone())
    }

    // Analysis results

    /// Stored analysis snapshots, newest first, optionally filtered by kind.
    pub async fn get_analysis_results(&self, kind: Option<AnalysisKind>) -> Vec<AnalysisResult> {
        let inner = self.inner.read().await;
        let mut results: Vec<AnalysisResult> = inner
            .analysis_results
            .values()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    pub async fn get_analysis_result(&self, id: i64) -> Option<AnalysisResult> {
        let inner = self.inner.read().await;
        inner.analysis_results.get(&id).cloned()
    }

    pub async fn create_analysis_result(&self, new: NewAnalysisResult) -> AnalysisResult {
        let mut inner = self.inner.write().await;
        inner.analysis_result_seq += 1;
        let result = AnalysisResult {
            id: inner.analysis_result_seq,
            kind: new.kind,
            indicators: new.indicators,
            parameters: new.parameters,
            results: new.results,
            created_at: new.created_at,
        };
        inner.analysis_results.insert(result.id, result.clone());
        result
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}
