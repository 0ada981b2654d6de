use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling frequency of a tracked series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    Unknown,
}

impl Frequency {
    /// Map a provider-reported frequency string, falling back to `Unknown`
    /// for anything unrecognized.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "daily" | "d" => Frequency::Daily,
            "weekly" | "w" => Frequency::Weekly,
            "monthly" | "m" => Frequency::Monthly,
            "quarterly" | "q" => Frequency::Quarterly,
            "annual" | "yearly" | "a" => Frequency::Annual,
            _ => Frequency::Unknown,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annual => "annual",
            Frequency::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A named time-series definition. `symbol` is the stable lookup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Id-less insert shape for [`Indicator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIndicator {
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub units: Option<String>,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Partial update for an indicator; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct IndicatorUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub units: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One dated observation belonging to an indicator. The observation is
/// kept as text to avoid precision loss across provider numeric formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorValue {
    pub id: i64,
    pub indicator_id: i64,
    pub date: DateTime<Utc>,
    pub value: String,
}

/// Id-less insert shape for [`IndicatorValue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewValue {
    pub indicator_id: i64,
    pub date: DateTime<Utc>,
    pub value: String,
}
